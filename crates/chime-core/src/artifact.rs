//! On-disk audio artifacts and their naming convention.
//!
//! Every artifact is named `reminder_<owner>.<ext>` inside the configured
//! artifact directory. The extension follows the format actually produced:
//! `wav` after a successful transcode, `mp3` when the synthesizer output is
//! kept as-is.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::OwnerId;

/// File-name prefix shared by every reminder artifact.
pub const ARTIFACT_PREFIX: &str = "reminder_";

/// Encoding of an artifact file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// 48 kHz stereo PCM, produced by transcoding.
    Wav,
    /// Native synthesizer output.
    Mp3,
}

impl ArtifactFormat {
    pub const ALL: [ArtifactFormat; 2] = [ArtifactFormat::Wav, ArtifactFormat::Mp3];

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Wav => "wav",
            ArtifactFormat::Mp3 => "mp3",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A synthesized audio file together with its explicit format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub format: ArtifactFormat,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Canonical artifact location for `owner` in `dir`.
    pub fn for_owner(dir: &Path, owner: OwnerId, format: ArtifactFormat) -> Self {
        Self::new(dir.join(file_name(owner, format)), format)
    }
}

/// `reminder_<owner>.<ext>`
pub fn file_name(owner: OwnerId, format: ArtifactFormat) -> String {
    format!("{ARTIFACT_PREFIX}{owner}.{}", format.extension())
}

/// True when `name` follows the artifact naming convention for any owner.
pub fn is_artifact_file_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(ARTIFACT_PREFIX) else {
        return false;
    };
    let Some((owner, ext)) = rest.rsplit_once('.') else {
        return false;
    };
    !owner.is_empty()
        && owner.bytes().all(|b| b.is_ascii_digit())
        && ArtifactFormat::from_extension(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_owner_and_extension() {
        assert_eq!(file_name(OwnerId(42), ArtifactFormat::Wav), "reminder_42.wav");
        assert_eq!(file_name(OwnerId(42), ArtifactFormat::Mp3), "reminder_42.mp3");
    }

    #[test]
    fn for_owner_joins_directory() {
        let a = Artifact::for_owner(Path::new("/tmp/chime"), OwnerId(7), ArtifactFormat::Wav);
        assert_eq!(a.path, Path::new("/tmp/chime/reminder_7.wav"));
        assert_eq!(a.format, ArtifactFormat::Wav);
    }

    #[test]
    fn recognises_artifact_names() {
        assert!(is_artifact_file_name("reminder_123.wav"));
        assert!(is_artifact_file_name("reminder_123.mp3"));
        assert!(is_artifact_file_name("reminder_123.WAV"));
    }

    #[test]
    fn ignores_unrelated_files() {
        for name in [
            "reminder_.wav",
            "reminder_abc.wav",
            "reminder_123.ogg",
            "reminder_123",
            "notes_123.wav",
            "reminder_cog.py",
        ] {
            assert!(!is_artifact_file_name(name), "matched {name}");
        }
    }
}
