// ── Builder web UI schema ──
//
// Default shape of the dashboard's state tree. Record templates (status
// triples, origins, packages, projects) are mounted wherever the UI keeps
// one of them.

use chrono::{Datelike, Utc};
use indexmap::IndexMap;

use super::{FieldDecl, Schema};
use crate::error::SchemaError;
use crate::stream::LogStream;
use crate::value::{Kind, Value};

/// Where the session token lives; seeded from the session source.
pub const SESSION_TOKEN_PATH: &str = "session.token";

fn string(path: &str, default: &str) -> FieldDecl {
    FieldDecl::new(path, Kind::Str, default)
}

fn flag(path: &str, default: bool) -> FieldDecl {
    FieldDecl::new(path, Kind::Bool, default)
}

fn int(path: &str, default: i64) -> FieldDecl {
    FieldDecl::new(path, Kind::Int, default)
}

fn list(path: &str) -> FieldDecl {
    FieldDecl::new(path, Kind::List, Vec::<Value>::new())
}

fn map(path: &str) -> FieldDecl {
    FieldDecl::new(path, Kind::Map, IndexMap::<String, Value>::new())
}

fn unset(path: &str, kind: Kind) -> FieldDecl {
    FieldDecl::optional(path, kind)
}

fn stream(path: &str) -> FieldDecl {
    FieldDecl::new(path, Kind::Stream, LogStream::new())
}

// ── Record templates ─────────────────────────────────────────────────

/// `errorMessage` / `exists` / `loading`, used by every fetch-backed view.
fn status(prefix: &str) -> Vec<FieldDecl> {
    vec![
        unset(&format!("{prefix}.errorMessage"), Kind::Str),
        flag(&format!("{prefix}.exists"), false),
        flag(&format!("{prefix}.loading"), true),
    ]
}

fn origin(prefix: &str) -> Vec<FieldDecl> {
    vec![
        unset(&format!("{prefix}.id"), Kind::Str),
        string(&format!("{prefix}.name"), ""),
        unset(&format!("{prefix}.owner_id"), Kind::Str),
        string(&format!("{prefix}.private_key_name"), ""),
        string(&format!("{prefix}.default_package_visibility"), "public"),
    ]
}

fn package(prefix: &str) -> Vec<FieldDecl> {
    vec![
        string(&format!("{prefix}.ident.origin"), ""),
        string(&format!("{prefix}.ident.name"), ""),
        string(&format!("{prefix}.ident.version"), ""),
        string(&format!("{prefix}.ident.release"), ""),
        string(&format!("{prefix}.checksum"), ""),
        string(&format!("{prefix}.manifest"), ""),
        string(&format!("{prefix}.config"), ""),
        string(&format!("{prefix}.target"), ""),
        list(&format!("{prefix}.deps")),
        list(&format!("{prefix}.tdeps")),
        list(&format!("{prefix}.exposes")),
        list(&format!("{prefix}.channels")),
        string(&format!("{prefix}.visibility"), "public"),
    ]
}

fn project(prefix: &str) -> Vec<FieldDecl> {
    vec![
        unset(&format!("{prefix}.id"), Kind::Str),
        string(&format!("{prefix}.name"), ""),
        string(&format!("{prefix}.origin_name"), ""),
        string(&format!("{prefix}.package_name"), ""),
        string(&format!("{prefix}.plan_path"), ""),
        unset(&format!("{prefix}.owner_id"), Kind::Str),
        string(&format!("{prefix}.vcs_type"), ""),
        string(&format!("{prefix}.vcs_data"), ""),
        unset(&format!("{prefix}.vcs_installation_id"), Kind::Str),
        string(&format!("{prefix}.visibility"), "public"),
        flag(&format!("{prefix}.auto_build"), false),
    ]
}

// ── Sub-records ──────────────────────────────────────────────────────

fn app(current_year: i64) -> Vec<FieldDecl> {
    vec![string("app.name", "Habitat"), int("app.currentYear", current_year)]
}

fn session() -> Vec<FieldDecl> {
    vec![string(SESSION_TOKEN_PATH, "").sensitive()]
}

fn git_hub() -> Vec<FieldDecl> {
    vec![
        unset("gitHub.authState", Kind::Str),
        unset("gitHub.authToken", Kind::Str).sensitive(),
        list("gitHub.installations"),
        list("gitHub.installationRepositories"),
        list("gitHub.orgs"),
        list("gitHub.repos"),
        list("gitHub.files"),
        unset("gitHub.selectedOrg", Kind::Str),
        unset("gitHub.username", Kind::Str),
        flag("gitHub.ui.orgs.loading", false),
        flag("gitHub.ui.repos.loading", false),
    ]
}

fn builds() -> Vec<FieldDecl> {
    let mut decls = vec![list("builds.visible")];
    decls.extend(
        [
            "id",
            "origin",
            "name",
            "version",
            "release",
            "state",
            "build_start",
            "build_stop",
            "created_at",
        ]
        .iter()
        .map(|field| unset(&format!("builds.selected.info.{field}"), Kind::Str)),
    );
    decls.extend([
        unset("builds.selected.log.start", Kind::Int),
        unset("builds.selected.log.stop", Kind::Int),
        stream("builds.selected.log.content"),
        unset("builds.selected.log.is_complete", Kind::Bool),
        unset("builds.selected.log.stream", Kind::Bool),
        flag("builds.selected.stream", false),
    ]);
    decls
}

fn notifications() -> Vec<FieldDecl> {
    vec![list("notifications.all")]
}

fn orgs() -> Vec<FieldDecl> {
    vec![
        list("orgs.added"),
        list("orgs.all"),
        unset("orgs.current.namespace", Kind::Str),
        unset("orgs.current.name", Kind::Str),
        unset("orgs.current.email", Kind::Str),
        unset("orgs.current.website", Kind::Str),
        list("orgs.current.members"),
        list("orgs.current.availableMemberSearchResults"),
        list("orgs.current.memberSearchResults"),
        flag("orgs.ui.create.saved", false),
    ]
}

fn origins() -> Vec<FieldDecl> {
    let mut decls = origin("origins.current");
    decls.extend([
        list("origins.currentPublicKeys"),
        list("origins.currentMembers"),
        list("origins.currentPendingInvitations"),
        list("origins.mine"),
        list("origins.myInvitations"),
        list("origins.currentIntegrations.docker"),
        flag("origins.ui.current.addingPublicKey", false),
        flag("origins.ui.current.addingPrivateKey", false),
        flag("origins.ui.current.creating", false),
        unset("origins.ui.current.errorMessage", Kind::Str),
        flag("origins.ui.current.exists", false),
        flag("origins.ui.current.loading", true),
        unset("origins.ui.current.privateKeyErrorMessage", Kind::Str),
        unset("origins.ui.current.publicKeyErrorMessage", Kind::Str),
        unset("origins.ui.current.publicKeyListErrorMessage", Kind::Str),
        unset("origins.ui.current.userInviteErrorMessage", Kind::Str),
        unset("origins.ui.current.integrationsSaveErrorMessage", Kind::Str),
        unset("origins.ui.mine.errorMessage", Kind::Str),
        flag("origins.ui.mine.loading", true),
    ]);
    decls
}

fn packages() -> Vec<FieldDecl> {
    let mut decls = package("packages.current");
    decls.extend([
        unset("packages.dashboard.origin", Kind::Str),
        list("packages.dashboard.recent"),
        list("packages.explore.popular"),
        list("packages.explore.your_app"),
        list("packages.explore.community"),
        int("packages.explore.stats.plans", 0),
        int("packages.explore.stats.builds", 0),
    ]);
    decls.extend(package("packages.latest"));
    decls.extend([
        unset("packages.latestInChannel.stable", Kind::Map),
        unset("packages.latestInChannel.unstable", Kind::Map),
        list("packages.visible"),
        unset("packages.versions", Kind::List),
        int("packages.nextRange", 0),
        string("packages.searchQuery", ""),
        int("packages.totalCount", 0),
    ]);
    for view in [
        "current",
        "latest",
        "latestInChannel.stable",
        "latestInChannel.unstable",
        "versions",
        "visible",
    ] {
        decls.extend(status(&format!("packages.ui.{view}")));
    }
    decls
}

fn projects() -> Vec<FieldDecl> {
    let mut decls = project("projects.current");
    decls.extend([
        flag("projects.ui.current.exists", false),
        flag("projects.ui.current.loading", true),
    ]);
    decls
}

fn router() -> Vec<FieldDecl> {
    vec![
        string("router.requestedRoute", ""),
        string("router.route", ""),
        string("router.redirectRoute", ""),
    ]
}

fn ui() -> Vec<FieldDecl> {
    vec![string("ui.layout", "default")]
}

fn users() -> Vec<FieldDecl> {
    vec![
        unset("users.current.email", Kind::Str),
        flag("users.current.isSignedIn", false),
        flag("users.current.isSigningIn", false),
        flag("users.current.isUserNavOpen", false),
        unset("users.current.username", Kind::Str),
        int("users.current.flags", 0),
        map("users.current.gitHub"),
    ]
}

fn feature_flags() -> Vec<FieldDecl> {
    vec![map("featureFlags.current")]
}

/// Full declaration table for the dashboard.
pub(crate) fn declarations(current_year: i64) -> Vec<FieldDecl> {
    [
        app(current_year),
        session(),
        git_hub(),
        builds(),
        notifications(),
        orgs(),
        origins(),
        packages(),
        projects(),
        router(),
        ui(),
        users(),
        feature_flags(),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl Schema {
    /// The Builder dashboard schema, with `app.currentYear` set to today's year.
    pub fn builder_web() -> Result<Self, SchemaError> {
        Self::from_decls(declarations(i64::from(Utc::now().year())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::KeyPath;
    use crate::schema::FieldSpec;

    fn field<'a>(schema: &'a Schema, path: &str) -> &'a FieldSpec {
        schema.field(&KeyPath::parse(path).unwrap()).unwrap()
    }

    #[test]
    fn table_validates() {
        let schema = Schema::builder_web().unwrap();
        assert!(schema.len() > 100);
    }

    #[test]
    fn status_triples_are_mounted_for_each_package_view() {
        let schema = Schema::builder_web().unwrap();
        for view in ["current", "latestInChannel.unstable", "visible"] {
            let spec = field(&schema, &format!("packages.ui.{view}.loading"));
            assert_eq!(spec.default, Value::Bool(true));
        }
    }

    #[test]
    fn credentials_are_marked_sensitive() {
        let schema = Schema::builder_web().unwrap();
        assert!(field(&schema, SESSION_TOKEN_PATH).sensitive);
        assert!(field(&schema, "gitHub.authToken").sensitive);
        assert!(!field(&schema, "router.route").sensitive);
    }

    #[test]
    fn member_search_results_default_empty() {
        let schema = Schema::builder_web().unwrap();
        let spec = field(&schema, "orgs.current.availableMemberSearchResults");
        assert_eq!(spec.default, Value::List(Vec::new()));
    }

    #[test]
    fn current_year_is_seeded() {
        let decls = declarations(2017);
        let year = decls.iter().find(|d| d.path == "app.currentYear").unwrap();
        assert_eq!(year.default, Value::Int(2017));
    }
}
