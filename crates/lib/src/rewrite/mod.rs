//! Source rewriter.
//!
//! Turns one CommonJS file into a `.pragma library` QML JavaScript file:
//!
//! 1. scan the source for `global.<name>` reads
//! 2. rewrite requires, in order: bindings (`var x = require(..);`),
//!    effect-only lines (`require(..);`), then inline `require(..)` calls
//! 3. reject any `require` left over in code (comments and strings are skipped)
//! 4. rewrite the getter and default re-export shapes
//! 5. assemble header, module prologue, body and global footer
//!
//! Resolving and building dependencies is delegated to a [`RewriteHost`], so
//! the rewriter itself never touches the session or the dependency graph.

pub mod patterns;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::consts::{POLYFILL_IMPORT, POLYFILL_PROVIDER, POLYFILLS};
use crate::error::BuildError;
use crate::resolve::{Target, file_directive, namespace_for_binding, namespace_for_specifier};
use crate::util::path::{relative, to_slash};

use patterns::{
  ANY_REQUIRE, BINDING_REQUIRE, INLINE_REQUIRE, effect_specifier, fix_exports, is_ident_char, mask_comments_and_strings,
  scan_globals, strip_effect_lines, try_replace_all,
};

/// A required dependency after resolution (and building, for files).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
  pub target: Target,
  /// Graph node: the display path for files, the module name otherwise.
  pub key: String,
  /// Output file, for file targets.
  pub out_path: Option<PathBuf>,
  /// Implicit globals the dependency exposes.
  pub globals: Vec<String>,
}

/// Services the rewriter needs from the build session.
pub trait RewriteHost {
  /// Resolve `specifier` as required from a file in `importer_dir`, building
  /// the target first when it is a file.
  fn require(&mut self, specifier: &str, importer_dir: &Path) -> Result<Dependency, BuildError>;

  /// Record that `from` requires `to`.
  fn register_edge(&mut self, from: &str, to: &str) -> Result<(), BuildError>;
}

/// The file being rewritten.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
  /// Graph node of this file.
  pub key: &'a str,
  pub path: &'a Path,
  pub out_path: &'a Path,
  pub use_polyfills: bool,
}

/// Result of rewriting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewritten {
  pub text: String,
  /// Source paths of file dependencies, in first-require order.
  pub dependencies: Vec<PathBuf>,
  /// Registered QML module names, in first-require order.
  pub modules: Vec<String>,
  /// Own and inherited implicit globals.
  pub globals: BTreeSet<String>,
}

/// Rewrite `text`, the (possibly lowered) contents of `file`.
pub fn rewrite<H: RewriteHost>(host: &mut H, file: &SourceFile<'_>, text: &str) -> Result<Rewritten, BuildError> {
  let mut rewriter = Rewriter::new(host, file);
  rewriter.globals = scan_globals(text);
  trace!(file = %file.key, globals = rewriter.globals.len(), "scanned implicit globals");

  let body = rewriter.rewrite_requires(text)?;
  let body = fix_exports(&body);
  Ok(rewriter.assemble(&body))
}

struct Rewriter<'h, 'f, H> {
  host: &'h mut H,
  file: &'f SourceFile<'f>,
  dir: PathBuf,
  out_dir: PathBuf,

  imports: Vec<String>,
  inherited: Vec<String>,
  accessors: HashMap<(String, String), String>,
  /// Namespace to the graph node bound to it.
  namespaces: HashMap<String, String>,

  dependencies: Vec<PathBuf>,
  modules: Vec<String>,
  globals: BTreeSet<String>,
  imported_globals: BTreeSet<String>,
}

impl<'h, 'f, H: RewriteHost> Rewriter<'h, 'f, H> {
  fn new(host: &'h mut H, file: &'f SourceFile<'f>) -> Self {
    let parent = |p: &Path| p.parent().map(Path::to_path_buf).unwrap_or_default();
    Self {
      host,
      file,
      dir: parent(file.path),
      out_dir: parent(file.out_path),
      imports: Vec::new(),
      inherited: Vec::new(),
      accessors: HashMap::new(),
      namespaces: HashMap::new(),
      dependencies: Vec::new(),
      modules: Vec::new(),
      globals: BTreeSet::new(),
      imported_globals: BTreeSet::new(),
    }
  }

  fn rewrite_requires(&mut self, text: &str) -> Result<String, BuildError> {
    let text = try_replace_all(&BINDING_REQUIRE, text, |caps| -> Result<Option<String>, BuildError> {
      let (keyword, name, specifier) = (&caps[1], &caps[2], &caps[3]);
      let accessor = self.require(specifier, &namespace_for_binding(name))?;
      Ok(Some(format!("{} {} = {};", keyword, name, accessor)))
    })?;

    for line in text.lines() {
      if let Some(specifier) = effect_specifier(line) {
        self.require(specifier, &namespace_for_specifier(specifier))?;
      }
    }
    let text = strip_effect_lines(&text);

    let text = try_replace_all(&INLINE_REQUIRE, &text, |caps| {
      let Some(whole) = caps.get(0) else { return Ok(None) };
      let preceded_by = text[..whole.start()].chars().next_back();
      if preceded_by.is_some_and(|c| is_ident_char(c) || c == '.') {
        return Ok(None);
      }
      let specifier = &caps[1];
      self.require(specifier, &namespace_for_specifier(specifier)).map(Some)
    })?;

    let code = mask_comments_and_strings(&text);
    for caps in ANY_REQUIRE.captures_iter(&code) {
      let Some(whole) = caps.get(0) else { continue };
      let preceded_by = code[..whole.start()].chars().next_back();
      if preceded_by.is_some_and(|c| is_ident_char(c) || c == '.') {
        continue;
      }
      let argument = caps
        .get(1)
        .map(|m| text.get(m.range()).unwrap_or(m.as_str()).trim())
        .unwrap_or_default();
      return Err(BuildError::InvalidImportForm {
        specifier: argument.to_string(),
        message: format!(
          "unsupported require form in {}: require() takes a single string literal",
          self.file.key
        ),
      });
    }

    Ok(text)
  }

  /// Resolve one require and return its inline accessor.
  ///
  /// The same specifier bound to the same namespace is resolved once per file.
  fn require(&mut self, specifier: &str, namespace: &str) -> Result<String, BuildError> {
    let memo_key = (specifier.to_string(), namespace.to_string());
    if let Some(accessor) = self.accessors.get(&memo_key) {
      return Ok(accessor.clone());
    }

    let dependency = self.host.require(specifier, &self.dir)?;
    self.bind_namespace(namespace, specifier, &dependency)?;
    self.add_dependency(&dependency, namespace)?;

    let directive = match (&dependency.target, &dependency.out_path) {
      (Target::Registered { .. }, _) => dependency.target.module_directive(namespace),
      (_, Some(out_path)) => Some(file_directive(&to_slash(&relative(out_path, &self.out_dir)), namespace)),
      (_, None) => None,
    };
    if let Some(directive) = directive
      && !self.imports.contains(&directive)
    {
      self.imports.push(directive);
    }

    let accessor = dependency.target.accessor(namespace);
    self.accessors.insert(memo_key, accessor.clone());
    Ok(accessor)
  }

  /// Reserve `namespace` for `dependency`. A namespace names one import per file.
  fn bind_namespace(&mut self, namespace: &str, specifier: &str, dependency: &Dependency) -> Result<(), BuildError> {
    match self.namespaces.get(namespace) {
      Some(bound) if *bound != dependency.key => Err(BuildError::InvalidImportForm {
        specifier: specifier.to_string(),
        message: format!(
          "namespace {} in {} is already bound to {}; rename the variable it is assigned to",
          namespace, self.file.key, bound
        ),
      }),
      Some(_) => Ok(()),
      None => {
        self.namespaces.insert(namespace.to_string(), dependency.key.clone());
        Ok(())
      }
    }
  }

  fn add_dependency(&mut self, dependency: &Dependency, namespace: &str) -> Result<(), BuildError> {
    for name in &dependency.globals {
      if self.imported_globals.insert(name.clone()) {
        self
          .inherited
          .push(format!("var {name} = global.{name} = {namespace}.global.{name};"));
      }
      self.globals.insert(name.clone());
    }

    match dependency.target.source_file() {
      Some(path) => {
        if !self.dependencies.iter().any(|dep| dep == path) {
          self.dependencies.push(path.to_path_buf());
        }
      }
      None => {
        if !self.modules.contains(&dependency.key) {
          self.modules.push(dependency.key.clone());
        }
      }
    }

    self.host.register_edge(self.file.key, &dependency.key)
  }

  fn assemble(self, body: &str) -> Rewritten {
    let basename = self
      .file
      .path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let mut header = vec![".pragma library".to_string()];
    if self.file.use_polyfills {
      header.push(POLYFILL_IMPORT.to_string());
    }
    header.extend(self.imports);

    let mut bindings = Vec::new();
    if self.file.use_polyfills {
      bindings.push(format!("var _Polyfills = {};", POLYFILL_PROVIDER));
      bindings.extend(POLYFILLS.iter().map(|name| format!("var {name} = _Polyfills.{name};")));
    }
    bindings.extend(self.inherited);

    let mut out = header.join("\n");
    out.push_str("\n\n");
    out.push_str(&prologue(&basename));
    if !bindings.is_empty() {
      out.push('\n');
      out.push_str(&bindings.join("\n"));
      out.push('\n');
    }
    out.push('\n');
    out.push_str(body);
    if !out.ends_with('\n') {
      out.push('\n');
    }

    for name in self.globals.difference(&self.imported_globals) {
      out.push_str(&format!("var {name} = global.{name};\n"));
    }

    let mut text = out.trim().to_string();
    text.push('\n');

    Rewritten {
      text,
      dependencies: self.dependencies,
      modules: self.modules,
      globals: self.globals,
    }
  }
}

/// Module wrapper emulating CommonJS on top of a QML library file.
fn prologue(basename: &str) -> String {
  format!(
    "var __filename = Qt.resolvedUrl('{basename}').substring(7);\n\
     var __dirname = __filename.substring(0, __filename.lastIndexOf('/'));\n\
     \n\
     var module = {{ exports: {{}} }};\n\
     var exports = module.exports;\n\
     var global = {{}};\n"
  )
}
