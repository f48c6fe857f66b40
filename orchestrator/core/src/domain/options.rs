// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::path::PathBuf;

use crate::domain::errors::ValidationError;

/// User-chosen policy for the previous version once a replace has succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploymentOptions {
    /// Keep the previous version around, stopped.
    pub keep_existing: bool,
    /// Keep the previous version running but take it off its routes.
    pub unmap_routes: bool,
}

/// What happens to `X-venerable` after the new version is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStrategy {
    Stop,
    UnmapRoutes,
    Delete,
}

impl DeploymentOptions {
    /// Resolve the flags by priority: keep > unmap > delete.
    pub fn finalize_strategy(&self) -> FinalizeStrategy {
        if self.keep_existing {
            FinalizeStrategy::Stop
        } else if self.unmap_routes {
            FinalizeStrategy::UnmapRoutes
        } else {
            FinalizeStrategy::Delete
        }
    }
}

/// Inputs of a deploy-replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRequest {
    pub app_name: String,
    pub manifest_path: Option<PathBuf>,
    pub app_path: Option<PathBuf>,
    pub options: DeploymentOptions,
}

/// A replace request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReplace {
    pub app_name: String,
    pub manifest_path: PathBuf,
    pub app_path: Option<PathBuf>,
    pub options: DeploymentOptions,
}

impl ReplaceRequest {
    pub fn validate(self) -> Result<ValidatedReplace, ValidationError> {
        if self.app_name.trim().is_empty() {
            return Err(ValidationError::MissingAppName);
        }
        let manifest_path = match self.manifest_path {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Err(ValidationError::NoManifest),
        };
        Ok(ValidatedReplace {
            app_name: self.app_name,
            manifest_path,
            // An empty `-p` means "no path", same as omitting it.
            app_path: self.app_path.filter(|p| !p.as_os_str().is_empty()),
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(manifest: Option<&str>) -> ReplaceRequest {
        ReplaceRequest {
            app_name: "appname".to_string(),
            manifest_path: manifest.map(PathBuf::from),
            app_path: Some(PathBuf::from("app-path")),
            options: DeploymentOptions::default(),
        }
    }

    #[test]
    fn test_default_strategy_is_delete() {
        assert_eq!(
            DeploymentOptions::default().finalize_strategy(),
            FinalizeStrategy::Delete
        );
    }

    #[test]
    fn test_keep_existing_wins_over_unmap() {
        let options = DeploymentOptions {
            keep_existing: true,
            unmap_routes: true,
        };
        assert_eq!(options.finalize_strategy(), FinalizeStrategy::Stop);
    }

    #[test]
    fn test_unmap_routes_strategy() {
        let options = DeploymentOptions {
            keep_existing: false,
            unmap_routes: true,
        };
        assert_eq!(options.finalize_strategy(), FinalizeStrategy::UnmapRoutes);
    }

    #[test]
    fn test_manifest_is_required() {
        assert_eq!(request(None).validate(), Err(ValidationError::NoManifest));
        assert_eq!(request(Some("")).validate(), Err(ValidationError::NoManifest));
    }

    #[test]
    fn test_valid_request() {
        let validated = request(Some("manifest-path")).validate().unwrap();
        assert_eq!(validated.manifest_path, PathBuf::from("manifest-path"));
        assert_eq!(validated.app_path, Some(PathBuf::from("app-path")));
    }

    #[test]
    fn test_empty_app_path_is_dropped() {
        let mut req = request(Some("manifest-path"));
        req.app_path = Some(PathBuf::new());
        assert_eq!(req.validate().unwrap().app_path, None);
    }
}
