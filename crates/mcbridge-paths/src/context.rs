//! Logical address of a staged transfer.

use serde::{Deserialize, Serialize};

use crate::join::{join_rooted, normalize_rooted};

/// Upper bound on `/`-separated pieces; anything past the project id stays in
/// the final piece unsplit.
const MAX_COMPONENTS: usize = 5;

/// Category, tenant, project and relative path recovered from a staging path.
///
/// Zero ids and an empty category mean "not resolved yet". Decoding never
/// fails; use the `is_*` predicates to tell a full scope from a partial one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferPathContext {
    /// Transfer class, e.g. a named upload channel. Empty at the root.
    pub category: String,
    /// Owning tenant (user) id, `0` when unresolved.
    pub tenant_id: u64,
    /// Owning project id, `0` when unresolved.
    pub project_id: u64,
    /// Remainder below the project directory, `/`-rooted once resolved.
    pub relative_path: String,
}

impl TransferPathContext {
    /// Build a fully-populated context; `relative_path` is normalised.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        tenant_id: u64,
        project_id: u64,
        relative_path: &str,
    ) -> Self {
        Self {
            category: category.into(),
            tenant_id,
            project_id,
            relative_path: normalize_rooted(relative_path),
        }
    }

    /// Decode a staging path.
    ///
    /// Short or malformed input degrades to zero ids and an empty relative
    /// path. Ids that fail to parse as unsigned integers decode as `0`. A path
    /// without a category decodes to the root context even when later pieces
    /// look like ids.
    #[must_use]
    pub fn decode(path: &str) -> Self {
        let mut parts = path.splitn(MAX_COMPONENTS, '/');
        let _leading = parts.next();
        let category = parts.next().unwrap_or_default();
        if category.is_empty() {
            return Self::default();
        }

        let tenant_id = parse_id(parts.next());
        let project_id = parse_id(parts.next());
        let relative_path = match parts.next() {
            Some(rest) => normalize_rooted(rest),
            None if tenant_id != 0 && project_id != 0 => normalize_rooted(""),
            None => String::new(),
        };

        Self {
            category: category.to_string(),
            tenant_id,
            project_id,
            relative_path,
        }
    }

    /// Path of the tenant/project staging directory: `/<category>/<tenant>/<project>`.
    #[must_use]
    pub fn scope_path(&self) -> String {
        let tenant = self.tenant_id.to_string();
        let project = self.project_id.to_string();
        join_rooted([self.category.as_str(), tenant.as_str(), project.as_str()])
    }

    /// Full staging path of `suffix` below this context's relative path.
    ///
    /// Pass an empty suffix to address the relative path itself.
    #[must_use]
    pub fn full_path(&self, suffix: &str) -> String {
        let scope = self.scope_path();
        join_rooted([scope.as_str(), self.relative_path.as_str(), suffix])
    }

    /// Path of `name` relative to the project directory.
    #[must_use]
    pub fn file_path(&self, name: &str) -> String {
        join_rooted([self.relative_path.as_str(), name])
    }

    /// No category resolved.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.category.is_empty()
    }

    /// Category resolved.
    #[must_use]
    pub const fn is_category(&self) -> bool {
        !self.category.is_empty()
    }

    /// Tenant id resolved.
    #[must_use]
    pub const fn is_tenant(&self) -> bool {
        self.tenant_id != 0
    }

    /// Project id resolved.
    #[must_use]
    pub const fn is_project(&self) -> bool {
        self.project_id != 0
    }
}

fn parse_id(piece: Option<&str>) -> u64 {
    piece.and_then(|raw| raw.parse().ok()).unwrap_or(0)
}
