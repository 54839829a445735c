//! Route table and access gate.
//!
//! Each entity gets five routes:
//!
//! | path                   | kind   | outlet  | resolves entity |
//! |------------------------|--------|---------|-----------------|
//! | `{name}`               | list   | primary | no              |
//! | `{name}/:id/view`      | view   | primary | yes             |
//! | `{name}/new`           | create | primary | yes (blank)     |
//! | `{name}/:id/edit`      | edit   | primary | yes             |
//! | `{name}/:id/delete`    | delete | popup   | yes             |
//!
//! All of them require `ROLE_USER` and share the page title key
//! `{app}.{name}.home.title`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entity::Entity;

/// Authority every entity route requires.
pub const ROLE_USER: &str = "ROLE_USER";

/// What a route shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Paged list.
    List,
    /// Read-only detail.
    View,
    /// Edit form on a blank entity.
    Create,
    /// Edit form on an existing entity.
    Edit,
    /// Delete confirmation.
    Delete,
}

/// Where a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlet {
    /// Main page area.
    Primary,
    /// Modal popup.
    Popup,
}

/// One entry in the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDef {
    /// Path pattern; `:id` marks the identifier segment.
    pub path: String,
    /// What the route shows.
    pub kind: RouteKind,
    /// Authorities any one of which grants access. Empty means public.
    pub authorities: Vec<String>,
    /// Page title message key.
    pub page_title: String,
    /// Rendering outlet.
    pub outlet: Outlet,
}

impl RouteDef {
    /// Whether the entity must be resolved before activation.
    pub fn resolves_entity(&self) -> bool {
        self.kind != RouteKind::List
    }

    /// Match a concrete path, returning the identifier segment if the
    /// pattern has one. `None` means no match.
    pub fn matches(&self, path: &str) -> Option<Option<String>> {
        let mut pattern = self.path.split('/');
        let mut actual = path.trim_matches('/').split('/');
        let mut id = None;

        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return Some(id),
                (Some(":id"), Some(segment)) if !segment.is_empty() => {
                    id = Some(segment.to_string());
                }
                (Some(expected), Some(segment)) if expected == segment => {}
                _ => return None,
            }
        }
    }
}

/// The routes for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

/// A matched route plus its identifier parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The matching route.
    pub route: &'a RouteDef,
    /// Identifier segment, for `:id` routes.
    pub id: Option<String>,
}

impl RouteTable {
    /// Build the standard routes for entity `E`.
    ///
    /// `app_name` prefixes the page title key.
    pub fn for_entity<E: Entity>(app_name: &str) -> Self {
        Self::with_authorities::<E>(app_name, &[ROLE_USER])
    }

    /// Build the standard routes for entity `E` with custom authorities.
    pub fn with_authorities<E: Entity>(app_name: &str, authorities: &[&str]) -> Self {
        let name = E::NAME;
        let route = |path: String, kind, outlet| RouteDef {
            path,
            kind,
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
            page_title: format!("{app_name}.{name}.home.title"),
            outlet,
        };

        Self {
            routes: vec![
                route(name.to_string(), RouteKind::List, Outlet::Primary),
                route(format!("{name}/:id/view"), RouteKind::View, Outlet::Primary),
                route(format!("{name}/new"), RouteKind::Create, Outlet::Primary),
                route(format!("{name}/:id/edit"), RouteKind::Edit, Outlet::Primary),
                route(format!("{name}/:id/delete"), RouteKind::Delete, Outlet::Popup),
            ],
        }
    }

    /// All routes in declaration order.
    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    /// First route matching `path`.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.matches(path).map(|id| RouteMatch { route, id })
        })
    }
}

/// Authorization predicate evaluated before a route activates.
pub trait AccessGate: Send + Sync {
    /// Whether `route` may activate.
    fn can_activate(&self, route: &RouteDef) -> bool;
}

/// Grants access when the user holds any of the route's authorities.
#[derive(Debug, Clone, Default)]
pub struct AuthorityGate {
    granted: BTreeSet<String>,
}

impl AuthorityGate {
    /// A gate for a user holding the given authorities.
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }

    /// A gate for an anonymous user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Whether the user holds any one of `authorities`.
    pub fn has_any_authority(&self, authorities: &[String]) -> bool {
        authorities.iter().any(|a| self.granted.contains(a))
    }
}

impl AccessGate for AuthorityGate {
    fn can_activate(&self, route: &RouteDef) -> bool {
        route.authorities.is_empty() || self.has_any_authority(&route.authorities)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::Hospital;

    fn table() -> RouteTable {
        RouteTable::for_entity::<Hospital>("amachouApp")
    }

    #[test]
    fn test_standard_routes() {
        let table = table();
        let paths: Vec<_> = table.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "hospital",
                "hospital/:id/view",
                "hospital/new",
                "hospital/:id/edit",
                "hospital/:id/delete",
            ]
        );
        for route in table.routes() {
            assert_eq!(route.authorities, vec![ROLE_USER.to_string()]);
            assert_eq!(route.page_title, "amachouApp.hospital.home.title");
        }
        assert_eq!(table.routes()[4].outlet, Outlet::Popup);
    }

    #[test]
    fn test_find_extracts_id() {
        let table = table();

        let m = table.find("hospital/42/edit").unwrap();
        assert_eq!(m.route.kind, RouteKind::Edit);
        assert_eq!(m.id.as_deref(), Some("42"));

        let m = table.find("/hospital/H-1/view/").unwrap();
        assert_eq!(m.route.kind, RouteKind::View);
        assert_eq!(m.id.as_deref(), Some("H-1"));
    }

    #[test]
    fn test_find_static_routes() {
        let table = table();
        assert_eq!(table.find("hospital").unwrap().route.kind, RouteKind::List);
        let new = table.find("hospital/new").unwrap();
        assert_eq!(new.route.kind, RouteKind::Create);
        assert!(new.id.is_none());
        assert!(new.route.resolves_entity());
    }

    #[test]
    fn test_find_rejects_unknown_paths() {
        let table = table();
        assert!(table.find("hospital/42").is_none());
        assert!(table.find("hospital//edit").is_none());
        assert!(table.find("clinic/1/view").is_none());
        assert!(table.find("hospital/1/edit/extra").is_none());
    }

    #[test]
    fn test_authority_gate() {
        let route = &table().routes()[0].clone();
        assert!(AuthorityGate::new(["ROLE_USER"]).can_activate(route));
        assert!(AuthorityGate::new(["ROLE_ADMIN", "ROLE_USER"]).can_activate(route));
        assert!(!AuthorityGate::new(["ROLE_ADMIN"]).can_activate(route));
        assert!(!AuthorityGate::anonymous().can_activate(route));
    }

    #[test]
    fn test_public_route_needs_no_authority() {
        let table = RouteTable::with_authorities::<Hospital>("amachouApp", &[]);
        assert!(AuthorityGate::anonymous().can_activate(&table.routes()[1]));
    }
}
