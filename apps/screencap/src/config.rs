use std::{
    collections::HashMap,
    env, io,
    path::{Path, PathBuf},
};

use crate::{error::Error, profile::Profile};

pub const CONFIG_ENV: &str = "SCREENCAP_CONFIG";
const CONFIG_FILE: &str = "screencap.toml";
const ENCODER_BIN: &str = "ffmpeg";

#[derive(serde::Serialize, serde::Deserialize, Debug, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub encoder: Option<PathBuf>,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
}

impl Config {
    /// Loads the first config file found. An explicit path must exist; the
    /// fallback locations are optional.
    pub fn load(path: Option<PathBuf>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::read(&path);
        }
        let fallbacks = env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(
                directories::ProjectDirs::from("", "", "screencap")
                    .map(|dirs| dirs.config_dir().join(CONFIG_FILE)),
            )
            .chain([PathBuf::from(CONFIG_FILE)]);
        for path in fallbacks {
            match Self::read(&path) {
                Err(Error::ConfigRead { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    continue;
                }
                res => return res,
            }
        }
        Ok(Config::default())
    }

    fn read(path: &Path) -> Result<Self, Error> {
        let config = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            source,
            path: path.to_path_buf(),
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::parse(&config)
    }

    pub fn parse(config: &str) -> Result<Self, Error> {
        Ok(toml::from_str(config)?)
    }

    /// Resolves a profile by name: the flag, then the config's `profile`
    /// key, then the default. Config profiles shadow built-in ones.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile, Error> {
        let name = name
            .or(self.profile.as_deref())
            .unwrap_or(Profile::DEFAULT_NAME);
        if let Some(profile) = self.profiles.get(name) {
            return Ok(profile.clone());
        }
        Profile::builtin()
            .remove(name)
            .ok_or_else(|| Error::UnknownProfile(name.to_string()))
    }

    /// Finds the encoder: the flag, then the config's `encoder` key, then `PATH`.
    pub fn encoder(&self, flag: Option<PathBuf>) -> Result<PathBuf, Error> {
        if let Some(path) = flag.or_else(|| self.encoder.clone()) {
            return Ok(path);
        }
        which::which(ENCODER_BIN).map_err(|_| Error::EncoderNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CaptureMode;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.profile(None).unwrap(), Profile::default());
        assert_eq!(config.profile(Some("video")).unwrap(), Profile::video());
        assert!(matches!(
            config.profile(Some("nope")),
            Err(Error::UnknownProfile(name)) if name == "nope"
        ));
    }

    #[test]
    fn partial_profile_fills_from_default() {
        let config = Config::parse(
            r#"
            encoder = "/opt/ffmpeg"
            profile = "quick"

            [profiles.quick]
            ask-mode = false
            mode = "video"
            extension = "mkv"

            [profiles.quick.framerate]
            default = 25

            [profiles.quick.keys]
            stop = [32]

            [profiles.quick.video-input]
            format = "kmsgrab"
            source = "-"
            "#,
        )
        .unwrap();
        let profile = config.profile(None).unwrap();
        assert!(!profile.ask_mode);
        assert_eq!(profile.mode, CaptureMode::Video);
        assert_eq!(profile.extension, "mkv");
        assert_eq!(profile.framerate.default, 25);
        assert_eq!(profile.framerate.max, 120);
        assert_eq!(profile.keys.stop, vec![b' ']);
        assert_eq!(profile.keys.start, 0x13);
        assert_eq!(profile.video_input.format, "kmsgrab");
        assert_eq!(profile.stop_command, "q\n");
        assert_eq!(
            config.encoder(None).unwrap(),
            PathBuf::from("/opt/ffmpeg")
        );
        assert_eq!(
            config.encoder(Some("/bin/enc".into())).unwrap(),
            PathBuf::from("/bin/enc")
        );
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "profile = \"video\"\n").unwrap();
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.profile(None).unwrap(), Profile::video());
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            Config::parse("profile = ["),
            Err(Error::Toml(_))
        ));
    }
}
