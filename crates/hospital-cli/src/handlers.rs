//! Handlers for the entity commands.
//!
//! Every handler activates a route through the [`Router`], so the access
//! gate and entity resolution behave exactly as they do for the screens.

use anyhow::{Context, Result, anyhow};
use hospital_core::{
    Activation, Direction, Entity, Hospital, ListView, PageRequest, Redirect, RouteTable, Router,
    SaveOutcome,
};
use serde::Serialize;
use std::io::Write;
use tracing::info;

/// Field changes for `new` and `edit`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct HospitalChanges {
    /// New display name.
    pub name: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
}

impl HospitalChanges {
    fn apply(self, hospital: &mut Hospital) {
        if let Some(name) = self.name {
            hospital.name = name;
        }
        if let Some(address) = self.address {
            hospital.address = Some(address);
        }
        if let Some(phone) = self.phone {
            hospital.phone = Some(phone);
        }
    }
}

// ============================================================================
// List and search
// ============================================================================

/// `hospital list`
pub async fn handle_list(
    router: &Router<Hospital>,
    request: PageRequest,
    out: &mut impl Write,
) -> Result<()> {
    let mut list = open_list(router).await?;
    list.load(request).await?;
    print_page(&list, out)
}

/// `hospital search <query>`
pub async fn handle_search(
    router: &Router<Hospital>,
    query: &str,
    request: PageRequest,
    out: &mut impl Write,
) -> Result<()> {
    let mut list = open_list(router).await?;
    list.search(query, request).await?;
    print_page(&list, out)
}

async fn open_list(router: &Router<Hospital>) -> Result<ListView<Hospital>> {
    match router.activate(Hospital::NAME).await? {
        Activation::List(list) => Ok(list),
        other => Err(unexpected(other)),
    }
}

fn print_page(list: &ListView<Hospital>, out: &mut impl Write) -> Result<()> {
    print_json(list.items(), out)?;
    writeln!(
        out,
        "page {} of {} ({} total)",
        list.request().page + 1,
        list.page_count().max(1),
        list.total_items()
    )?;
    Ok(())
}

// ============================================================================
// View, create, edit
// ============================================================================

/// `hospital view <id>`
pub async fn handle_view(router: &Router<Hospital>, id: &str, out: &mut impl Write) -> Result<()> {
    match router.activate(&format!("{}/{id}/view", Hospital::NAME)).await? {
        Activation::View(view) => {
            print_json(view.entity(), out)?;
            view.previous_state();
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

/// `hospital new --name ...`
pub async fn handle_new(
    router: &Router<Hospital>,
    changes: HospitalChanges,
    out: &mut impl Write,
) -> Result<()> {
    save(router, &format!("{}/new", Hospital::NAME), changes, out).await
}

/// `hospital edit <id> ...`
pub async fn handle_edit(
    router: &Router<Hospital>,
    id: &str,
    changes: HospitalChanges,
    out: &mut impl Write,
) -> Result<()> {
    save(router, &format!("{}/{id}/edit", Hospital::NAME), changes, out).await
}

async fn save(
    router: &Router<Hospital>,
    path: &str,
    changes: HospitalChanges,
    out: &mut impl Write,
) -> Result<()> {
    let session = match router.activate(path).await? {
        Activation::Edit(session) => session,
        other => return Err(unexpected(other)),
    };

    session.edit(|hospital| changes.apply(hospital))?;
    let outcome = session
        .save()
        .await
        .with_context(|| format!("saving {path}"))?;
    print_outcome(&outcome, out)
}

fn print_outcome(outcome: &SaveOutcome<Hospital>, out: &mut impl Write) -> Result<()> {
    if let Some(saved) = &outcome.saved {
        print_json(saved, out)?;
    }
    if let Some(alert) = &outcome.alert {
        info!(param = ?alert.param, "{}", alert.message);
    }
    Ok(())
}

// ============================================================================
// Delete
// ============================================================================

/// `hospital delete <id> [--yes]`
///
/// Without `yes` the dialog is cancelled and nothing is sent.
pub async fn handle_delete(
    router: &Router<Hospital>,
    id: &str,
    yes: bool,
    out: &mut impl Write,
) -> Result<()> {
    let dialog = match router.activate(&format!("{}/{id}/delete", Hospital::NAME)).await? {
        Activation::Delete(dialog) => dialog,
        other => return Err(unexpected(other)),
    };

    if !yes {
        dialog.cancel();
        writeln!(
            out,
            "Not deleted: pass --yes to delete \"{}\"",
            dialog.entity().name
        )?;
        return Ok(());
    }

    let alert = dialog.confirm_delete().await?;
    if let Some(alert) = alert {
        info!(param = ?alert.param, "{}", alert.message);
    }
    writeln!(out, "Deleted {} {id}", Hospital::NAME)?;
    Ok(())
}

// ============================================================================
// Routes
// ============================================================================

/// `hospital routes`
pub fn handle_routes(routes: &RouteTable, out: &mut impl Write) -> Result<()> {
    for route in routes.routes() {
        writeln!(
            out,
            "{:<22} {:<7} {:<8} {:<32} {}",
            route.path,
            label(&route.kind)?,
            label(&route.outlet)?,
            route.authorities.join(","),
            route.page_title
        )?;
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Build a page request from the `list` flags.
pub fn page_request(page: u32, size: u32, sort: Option<(String, Direction)>) -> PageRequest {
    let request = PageRequest::page(page).with_size(size);
    match sort {
        Some((field, direction)) => request.sorted_by(field, direction),
        None => request,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, out: &mut impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn label<T: Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}

fn unexpected(activation: Activation<Hospital>) -> anyhow::Error {
    match activation {
        Activation::Redirect(Redirect::AccessDenied { path }) => {
            anyhow!("access to {path} denied; check routes.authorities")
        }
        Activation::Redirect(Redirect::NotFound { id }) => {
            anyhow!("{} {id} not found", Hospital::NAME)
        }
        Activation::Redirect(Redirect::List { cause: Some(e) }) => {
            anyhow::Error::new(e).context(format!("{} could not be loaded", Hospital::NAME))
        }
        Activation::Redirect(Redirect::List { cause: None }) => {
            anyhow!("{} not found; run `hospital list`", Hospital::NAME)
        }
        Activation::Redirect(Redirect::Error(e)) => anyhow::Error::new(e),
        other => anyhow!("unexpected screen {other:?}"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hospital_core::transport::Call;
    use hospital_core::{
        AuthorityGate, Envelope, Error, History, MockTransport, ResolutionFallback, SaveError,
    };
    use std::sync::Arc;

    fn router(mock: &MockTransport<Hospital>) -> Router<Hospital> {
        router_with(mock, AuthorityGate::new(["ROLE_USER"]))
    }

    fn router_with(mock: &MockTransport<Hospital>, gate: AuthorityGate) -> Router<Hospital> {
        Router::new(
            RouteTable::for_entity::<Hospital>("amachouApp"),
            Arc::new(gate),
            Arc::new(mock.clone()),
            Arc::new(History::new()),
        )
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_list_prints_page_summary() {
        let mock = MockTransport::new().with_page(Ok(Envelope::ok(vec![
            Hospital::with_id("1", "North"),
            Hospital::with_id("2", "South"),
        ])
        .with_total_count(12)));
        let mut out = Vec::new();

        handle_list(&router(&mock), page_request(1, 2, None), &mut out)
            .await
            .unwrap();

        let out = output(out);
        assert!(out.contains("\"North\""));
        assert!(out.ends_with("page 2 of 6 (12 total)\n"));
        assert_eq!(
            mock.calls(),
            vec![Call::Query(PageRequest::page(1).with_size(2))]
        );
    }

    #[tokio::test]
    async fn test_search_uses_search_endpoint() {
        let mock = MockTransport::new();
        let mut out = Vec::new();

        handle_search(&router(&mock), "mary", PageRequest::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec![Call::Search("mary".into())]);
        assert!(output(out).contains("page 1 of 1 (0 total)"));
    }

    #[tokio::test]
    async fn test_view_prints_hospital() {
        let mock = MockTransport::new()
            .with_find(Ok(Envelope::ok(Hospital::with_id("42", "St. Mary"))));
        let mut out = Vec::new();

        handle_view(&router(&mock), "42", &mut out).await.unwrap();

        let printed: Hospital = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(printed, Hospital::with_id("42", "St. Mary"));
    }

    #[tokio::test]
    async fn test_view_missing_hospital_fails() {
        let mock = MockTransport::new();
        let err = handle_view(&router(&mock), "9", &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "hospital 9 not found");
    }

    #[tokio::test]
    async fn test_view_with_list_fallback_reports_cause() {
        let mock = MockTransport::new().with_find(Err(Error::transport("connection reset")));
        let router = router(&mock).with_fallback(ResolutionFallback::List);

        let err = handle_view(&router, "1", &mut Vec::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "hospital could not be loaded");
        assert!(err.root_cause().to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_new_creates_without_find() {
        let mock = MockTransport::new();
        let changes = HospitalChanges {
            name: Some("Riverside".into()),
            phone: Some("555".into()),
            ..Default::default()
        };
        let mut out = Vec::new();

        handle_new(&router(&mock), changes, &mut out).await.unwrap();

        assert_eq!(mock.calls(), vec![Call::Create]);
        let printed: Hospital = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(printed.name, "Riverside");
        assert_eq!(printed.phone.as_deref(), Some("555"));
    }

    #[tokio::test]
    async fn test_edit_keeps_untouched_fields() {
        let mut existing = Hospital::with_id("7", "East");
        existing.address = Some("1 Main St".into());
        let mock = MockTransport::new().with_find(Ok(Envelope::ok(existing)));
        let changes = HospitalChanges {
            name: Some("East Wing".into()),
            ..Default::default()
        };
        let mut out = Vec::new();

        handle_edit(&router(&mock), "7", changes, &mut out).await.unwrap();

        let printed: Hospital = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(printed.name, "East Wing");
        assert_eq!(printed.address.as_deref(), Some("1 Main St"));
        assert_eq!(
            mock.calls(),
            vec![Call::Find("7".into()), Call::Update("7".into())]
        );
    }

    #[tokio::test]
    async fn test_edit_surfaces_save_error() {
        let mock = MockTransport::new()
            .with_find(Ok(Envelope::ok(Hospital::with_id("7", "East"))))
            .with_save(Err(Error::status(409, "stale")));

        let err = handle_edit(&router(&mock), "7", HospitalChanges::default(), &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SaveError>(),
            Some(SaveError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_without_yes_cancels() {
        let mock = MockTransport::new()
            .with_find(Ok(Envelope::ok(Hospital::with_id("3", "Old"))));
        let mut out = Vec::new();

        handle_delete(&router(&mock), "3", false, &mut out).await.unwrap();

        assert!(output(out).contains("pass --yes"));
        assert_eq!(mock.count(|c| matches!(c, Call::Delete(_))), 0);
    }

    #[tokio::test]
    async fn test_delete_with_yes() {
        let mock = MockTransport::new()
            .with_find(Ok(Envelope::ok(Hospital::with_id("3", "Old"))));
        let mut out = Vec::new();

        handle_delete(&router(&mock), "3", true, &mut out).await.unwrap();

        assert_eq!(output(out), "Deleted hospital 3\n");
        assert_eq!(mock.count(|c| matches!(c, Call::Delete(id) if id == "3")), 1);
    }

    #[tokio::test]
    async fn test_denied_user_never_reaches_backend() {
        let mock = MockTransport::new();
        let router = router_with(&mock, AuthorityGate::new(["ROLE_ADMIN"]));

        let err = handle_delete(&router, "3", true, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("access to hospital/3/delete denied"));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_routes_table() {
        let mut out = Vec::new();
        handle_routes(&RouteTable::for_entity::<Hospital>("amachouApp"), &mut out).unwrap();

        let out = output(out);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("hospital "));
        assert!(lines[4].contains("delete"));
        assert!(lines[4].contains("popup"));
        assert!(lines[4].ends_with("amachouApp.hospital.home.title"));
    }

    #[test]
    fn test_page_request_with_sort() {
        let request = page_request(0, 10, Some(("name".into(), Direction::Desc)));
        assert_eq!(request.size, 10);
        assert_eq!(request.sort, Some(("name".to_string(), Direction::Desc)));
    }
}
