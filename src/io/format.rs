use std::{fmt, path::Path};

use anyhow::{Result, bail};

/// Formats a development config document may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension, defaulting to JSON when there is none.
    pub fn from_path(path: &Path) -> Result<Self> {
        let Some(ext) = path.extension() else {
            return Ok(DocumentFormat::Json);
        };
        let normalized = ext.to_string_lossy().to_ascii_lowercase();
        match normalized.as_str() {
            "json" => Ok(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            #[cfg(not(feature = "yaml"))]
            "yaml" | "yml" => bail!("yaml documents require the `yaml` feature"),
            #[cfg(feature = "toml")]
            "toml" => Ok(DocumentFormat::Toml),
            #[cfg(not(feature = "toml"))]
            "toml" => bail!("toml documents require the `toml` feature"),
            other => bail!("unsupported document extension `{other}`"),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_selects_the_format() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("field.JSON")).unwrap(),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("field")).unwrap(),
            DocumentFormat::Json
        );
        assert!(DocumentFormat::from_path(Path::new("field.ini")).is_err());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yml_is_yaml() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("field.yml")).unwrap(),
            DocumentFormat::Yaml
        );
    }
}
