//! Build orchestration.
//!
//! A [`Session`] owns everything that lives for one invocation: the module
//! registry, the project manifest, located packages, the build units, the
//! dependency graph and the cache. Building is single threaded and depth
//! first: a file requiring another blocks until the other (and everything it
//! requires) is built.
//!
//! # Submodules
//!
//! - [`unit`] - per-file build records and staleness
//! - [`report`] - what a session rebuilt

pub mod report;
pub mod unit;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::cache::BuildCache;
use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::graph::DependencyGraph;
use crate::lower::{CommandLowering, Lowering};
use crate::manifest::{ModuleRegistry, ProjectManifest};
use crate::resolve::{PackageRegistry, Resolver, Target};
use crate::rewrite::{Dependency, RewriteHost, SourceFile, rewrite};
use crate::util::path::{display_key, is_same_file, normalize};

pub use report::{BuildAction, BuildReport, BuiltFile};
pub use unit::{BuildUnit, Scope, UnitState};

/// One build invocation.
pub struct Session {
  options: BuildOptions,
  modules: ModuleRegistry,
  project: ProjectManifest,
  packages: PackageRegistry,
  units: HashMap<PathBuf, BuildUnit>,
  in_progress: HashSet<PathBuf>,
  graph: DependencyGraph,
  cache: BuildCache,
  lowering: Box<dyn Lowering>,
  report: BuildReport,
}

impl Session {
  /// Start a session.
  ///
  /// `modules` is the registry of declaratively exported QML modules, scanned
  /// once by the caller before anything is resolved.
  pub fn new(options: BuildOptions, modules: ModuleRegistry) -> Result<Self, BuildError> {
    let project = ProjectManifest::load(&options.project_manifest_path())?;
    let cache = BuildCache::load(&options.cache_path());
    let packages = PackageRegistry::new(options.packages_dir(), options.dependencies_out_dir());
    let lowering = Box::new(CommandLowering::new(options.lowering_command.clone()));

    debug!(
      build_dir = %options.build_dir.display(),
      modules = modules.len(),
      cached = cache.len(),
      "starting build session"
    );

    Ok(Self {
      options,
      modules,
      project,
      packages,
      units: HashMap::new(),
      in_progress: HashSet::new(),
      graph: DependencyGraph::new(),
      cache,
      lowering,
      report: BuildReport::default(),
    })
  }

  /// Replace the lowering compiler.
  pub fn with_lowering(mut self, lowering: Box<dyn Lowering>) -> Self {
    self.lowering = lowering;
    self
  }

  /// Build a file, or every file under a directory.
  ///
  /// Relative paths are taken relative to the working directory. When walking
  /// a directory the build directory is skipped if it lies inside it.
  pub fn build(&mut self, path: &Path) -> Result<(), BuildError> {
    let path = normalize(&self.options.work_dir.join(path));
    let metadata = fs::metadata(&path).map_err(|e| BuildError::io(&path, e))?;

    if !metadata.is_dir() {
      let scope = self.scope(path.parent().map(Path::to_path_buf).unwrap_or_default());
      return self.build_file(&path, &scope);
    }

    let scope = self.scope(path.clone());
    let build_dir = self.options.build_dir.clone();
    let walker = WalkDir::new(&path)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !(entry.file_type().is_dir() && is_same_file(entry.path(), &build_dir)));

    for entry in walker {
      let entry = entry.map_err(|e| {
        let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
        BuildError::io(at, e.into())
      })?;
      if entry.file_type().is_file() {
        self.build_file(entry.path(), &scope)?;
      }
    }

    Ok(())
  }

  fn scope(&self, root: PathBuf) -> Scope {
    Scope {
      root,
      out_root: self.options.build_dir.clone(),
      lower: self.options.use_lowering,
    }
  }

  /// Build one file unless it was already built, or is being built, in this
  /// session.
  fn build_file(&mut self, path: &Path, scope: &Scope) -> Result<(), BuildError> {
    let path = normalize(path);
    if self.units.contains_key(&path) || self.in_progress.contains(&path) {
      trace!(file = %path.display(), "already built in this session");
      return Ok(());
    }

    self.in_progress.insert(path.clone());
    let unit = BuildUnit::new(&path, scope, &self.options.work_dir);
    let result = self.run_unit(unit, scope);
    self.in_progress.remove(&path);

    self.units.insert(path, result?);
    Ok(())
  }

  fn run_unit(&mut self, mut unit: BuildUnit, scope: &Scope) -> Result<BuildUnit, BuildError> {
    let stale = unit.is_stale(self.options.engine_stamp)?;

    if !unit.is_script() {
      if stale {
        info!(file = %unit.key, "copying");
        unit.copy_output()?;
        unit.state = UnitState::Copied;
        self.report.record(&unit.key, BuildAction::Copied);
      } else {
        self.report.record_fresh(&unit.key);
      }
      return Ok(unit);
    }

    if !stale {
      match self.cache.get(&unit.key).cloned() {
        Some(entry) => {
          unit.restore(&entry);
          self.restore_edges(&unit)?;
          unit.state = UnitState::Cached;
          self.report.record_fresh(&unit.key);
          debug!(file = %unit.key, dependencies = unit.dependencies.len(), "up to date, restored from cache");
          return Ok(unit);
        }
        None => debug!(file = %unit.key, "up to date but not cached, rebuilding"),
      }
    }

    self.rewrite_unit(&mut unit, scope)?;
    Ok(unit)
  }

  fn rewrite_unit(&mut self, unit: &mut BuildUnit, scope: &Scope) -> Result<(), BuildError> {
    info!(file = %unit.key, "building");

    let text = if scope.lower {
      self.lowering.lower(&unit.path)?
    } else {
      fs::read_to_string(&unit.path).map_err(|e| BuildError::io(&unit.path, e))?
    };

    let file = SourceFile {
      key: &unit.key,
      path: &unit.path,
      out_path: &unit.out_path,
      use_polyfills: self.options.use_polyfills,
    };
    let rewritten = {
      let mut host = UnitHost { session: self, scope };
      rewrite(&mut host, &file, &text)?
    };

    unit.write_output(&rewritten.text)?;
    unit.dependencies = rewritten.dependencies;
    unit.modules = rewritten.modules;
    unit.globals = rewritten.globals;
    unit.state = UnitState::Rewritten;

    self.cache.upsert(unit.key.clone(), unit.cache_entry());
    self.cache.save(&self.options.cache_path())?;
    self.report.record(&unit.key, BuildAction::Rewritten);
    Ok(())
  }

  /// Put the edges of a unit restored from the cache back into the graph.
  fn restore_edges(&mut self, unit: &BuildUnit) -> Result<(), BuildError> {
    for dep in &unit.dependencies {
      let to = display_key(dep, &self.options.work_dir);
      self.graph.register_edge(&unit.key, &to)?;
    }
    for module in &unit.modules {
      self.graph.register_edge(&unit.key, module)?;
    }
    Ok(())
  }

  /// Summary of a file target, built or in progress.
  fn file_dependency(&self, target: Target, path: &Path, scope: &Scope) -> Dependency {
    let (key, out_path, globals) = match self.units.get(path) {
      Some(unit) => (
        unit.key.clone(),
        unit.out_path.clone(),
        unit.globals.iter().cloned().collect(),
      ),
      None => {
        // still on the stack: a cycle the graph is about to report
        let unit = BuildUnit::new(path, scope, &self.options.work_dir);
        (unit.key, unit.out_path, Vec::new())
      }
    };

    Dependency {
      target,
      key,
      out_path: Some(out_path),
      globals,
    }
  }

  pub fn options(&self) -> &BuildOptions {
    &self.options
  }

  pub fn modules(&self) -> &ModuleRegistry {
    &self.modules
  }

  pub fn graph(&self) -> &DependencyGraph {
    &self.graph
  }

  pub fn cache(&self) -> &BuildCache {
    &self.cache
  }

  pub fn report(&self) -> &BuildReport {
    &self.report
  }

  /// The build record of an input file, if it was visited.
  pub fn unit(&self, path: &Path) -> Option<&BuildUnit> {
    self.units.get(&normalize(&self.options.work_dir.join(path)))
  }

  /// Finish the session and return what was built.
  pub fn finish(self) -> BuildReport {
    self.report
  }
}

/// Resolves requires on behalf of the unit being rewritten.
struct UnitHost<'s> {
  session: &'s mut Session,
  scope: &'s Scope,
}

impl RewriteHost for UnitHost<'_> {
  fn require(&mut self, specifier: &str, importer_dir: &Path) -> Result<Dependency, BuildError> {
    let session = &mut *self.session;
    let target = Resolver::new(&session.modules, &session.project).resolve(
      specifier,
      importer_dir,
      &mut session.packages,
    )?;

    match target {
      Target::Local { ref path } => {
        let path = path.clone();
        session.build_file(&path, self.scope)?;
        Ok(session.file_dependency(target, &path, self.scope))
      }
      Target::Package {
        ref path,
        ref root,
        ref out_root,
        ..
      } => {
        let path = path.clone();
        let scope = Scope {
          root: root.clone(),
          out_root: out_root.clone(),
          lower: false,
        };
        session.build_file(&path, &scope)?;
        Ok(session.file_dependency(target, &path, &scope))
      }
      Target::Registered { ref name, .. } => Ok(Dependency {
        key: name.clone(),
        out_path: None,
        globals: Vec::new(),
        target,
      }),
    }
  }

  fn register_edge(&mut self, from: &str, to: &str) -> Result<(), BuildError> {
    self.session.graph.register_edge(from, to)?;
    Ok(())
  }
}
