//! Per-requirement lifecycle hooks.
//!
//! Hooks observe the pipeline; they cannot stop it. Each one is called
//! synchronously with a [`HookContext`] describing the stage and runs to
//! completion before the pipeline moves on.

use super::{context::BuildContext, requirement::{Requirement, normalize_name}};
use std::{collections::HashMap, fmt, path::Path};

/// Pipeline stages a hook can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    DownloadBefore,
    DownloadAfter,
    UnpackBefore,
    UnpackAfter,
    BuildBefore,
    BuildAfter,
    InstallBefore,
    InstallAfter,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::DownloadBefore,
        Stage::DownloadAfter,
        Stage::UnpackBefore,
        Stage::UnpackAfter,
        Stage::BuildBefore,
        Stage::BuildAfter,
        Stage::InstallBefore,
        Stage::InstallAfter,
    ];

    /// Dotted stage name, e.g. `download.before`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DownloadBefore => "download.before",
            Stage::DownloadAfter => "download.after",
            Stage::UnpackBefore => "unpack.before",
            Stage::UnpackAfter => "unpack.after",
            Stage::BuildBefore => "build.before",
            Stage::BuildAfter => "build.after",
            Stage::InstallBefore => "install.before",
            Stage::InstallAfter => "install.after",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data handed to a hook. Fields that do not apply to the stage are `None`:
/// `fetch_url` is set for `download.before`, `archive` from
/// `download.after` through `unpack.before`, `build_location` afterwards.
pub struct HookContext<'a> {
    pub stage: Stage,
    pub requirement: &'a Requirement,
    pub build_context: &'a BuildContext,
    pub fetch_url: Option<&'a str>,
    pub archive: Option<&'a Path>,
    pub build_location: Option<&'a Path>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        stage: Stage,
        requirement: &'a Requirement,
        build_context: &'a BuildContext,
    ) -> Self {
        Self {
            stage,
            requirement,
            build_context,
            fetch_url: None,
            archive: None,
            build_location: None,
        }
    }
}

type Hook = Box<dyn Fn(&HookContext<'_>)>;

/// Hooks keyed by requirement name and stage.
#[derive(Default)]
pub struct StageHooks {
    hooks: HashMap<String, HashMap<Stage, Hook>>,
}

impl StageHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` for `stage` of the requirement named `name`,
    /// replacing any previous hook for the same slot.
    pub fn on<F>(mut self, name: &str, stage: Stage, hook: F) -> Self
    where
        F: Fn(&HookContext<'_>) + 'static,
    {
        self.hooks
            .entry(normalize_name(name))
            .or_default()
            .insert(stage, Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Calls the hook registered for the context's requirement and stage.
    pub(crate) fn fire(&self, ctx: &HookContext<'_>) {
        let Some(hook) = self
            .hooks
            .get(&ctx.requirement.key())
            .and_then(|stages| stages.get(&ctx.stage))
        else {
            return;
        };

        log::info!("Calling hook for {} at stage {}", ctx.requirement.name(), ctx.stage);
        hook(ctx);
    }
}

impl fmt::Debug for StageHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, stages) in &self.hooks {
            let names: Vec<&str> = stages.keys().map(Stage::as_str).collect();
            map.entry(name, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn stage_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_name(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_name("configure.before"), None);
    }

    #[tokio::test]
    async fn fires_only_matching_slot() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::create(dir.path().to_path_buf(), "proj").await.unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let hooks = {
            let seen = Rc::clone(&seen);
            let other = Rc::clone(&seen);
            StageHooks::new()
                .on("Some_Pkg", Stage::DownloadBefore, move |c| {
                    seen.borrow_mut().push(c.fetch_url.map(String::from));
                })
                .on("other", Stage::DownloadBefore, move |_| {
                    other.borrow_mut().push(None);
                })
        };

        let req = Requirement::parse("some-pkg==1.0").unwrap();
        let mut hook_ctx = HookContext::new(Stage::DownloadBefore, &req, &ctx);
        hook_ctx.fetch_url = Some("https://example.invalid/some-pkg-1.0.tar.gz");
        hooks.fire(&hook_ctx);
        hooks.fire(&HookContext::new(Stage::DownloadAfter, &req, &ctx));

        assert_eq!(
            *seen.borrow(),
            vec![Some("https://example.invalid/some-pkg-1.0.tar.gz".to_string())]
        );
    }
}
