//! Stamp placement options

use crate::{Result, StampError};
use serde::{Deserialize, Serialize};

fn default_scale() -> f64 {
    0.5
}

fn default_opacity() -> f32 {
    1.0
}

/// How a stamp is placed on each page
///
/// ```json
/// { "scale": 0.5, "opacity": 0.3, "pages": [1, 3] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StampOptions {
    /// Fraction of the page's shorter side the stamp occupies (0, 1]
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Fill and stroke opacity [0, 1]
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// 1-indexed pages to stamp; every page when absent
    pub pages: Option<Vec<usize>>,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            opacity: default_opacity(),
            pages: None,
        }
    }
}

impl StampOptions {
    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| StampError::InvalidArgument(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            return Err(StampError::InvalidArgument(format!(
                "scale must be in (0, 1], got {}",
                self.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(StampError::InvalidArgument(format!(
                "opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }

    /// Pages to stamp for a document with `page_count` pages
    pub fn target_pages(&self, page_count: usize) -> Result<Vec<usize>> {
        match &self.pages {
            None => Ok((1..=page_count).collect()),
            Some(pages) => {
                if let Some(&bad) = pages.iter().find(|&&p| p == 0 || p > page_count) {
                    return Err(StampError::InvalidPage(bad, page_count));
                }
                let mut pages = pages.clone();
                pages.sort_unstable();
                pages.dedup();
                Ok(pages)
            }
        }
    }

    /// Whether an `/ExtGState` is needed to apply the opacity
    pub fn is_translucent(&self) -> bool {
        self.opacity < 1.0
    }
}
