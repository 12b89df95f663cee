use crate::http::{with_query, PortalTransport};
use crate::models::{Scope, Session, StudentProfile};

const SWITCH_PATH: &str = "login/switchchild";

async fn request_switch(
    transport: &dyn PortalTransport,
    session: &Session,
    target: &str,
) -> Result<(), String> {
    let url = with_query(&session.base_url, SWITCH_PATH, &[("studentid", target)]);
    let response = transport.get(&url).await.map_err(|e| e.to_string())?;

    if !response.is_success() {
        return Err(format!("status {}", response.status));
    }
    if response.body.trim() != "OK" {
        let prefix: String = response.body.trim().chars().take(40).collect();
        return Err(format!("unexpected reply {prefix:?}"));
    }
    Ok(())
}

/// Moves the session into `student`'s scope. Returns whether the portal agreed.
pub async fn switch_to(
    transport: &dyn PortalTransport,
    session: &mut Session,
    student: &StudentProfile,
) -> bool {
    let Some(id) = student.id.as_deref() else {
        return false;
    };
    if session.user_id.as_deref() == Some(id) {
        tracing::debug!(student = %student.name, "profile is the signed-in account, no switch needed");
        return true;
    }

    match request_switch(transport, session, id).await {
        Ok(()) => {
            tracing::debug!(student = %student.name, "switched to student scope");
            session.scope = Scope::Student(id.to_string());
            true
        }
        Err(reason) => {
            tracing::warn!(student = %student.name, %reason, "context switch failed, continuing");
            false
        }
    }
}

/// Restores guardian scope. The local scope is reset even if the portal refuses.
pub async fn switch_back(transport: &dyn PortalTransport, session: &mut Session) {
    if session.scope == Scope::Guardian {
        return;
    }

    match session.user_id.clone() {
        Some(user_id) => {
            if let Err(reason) = request_switch(transport, session, &user_id).await {
                tracing::warn!(%reason, "switch back to guardian scope failed");
            }
        }
        None => tracing::debug!("no guardian id known, skipping switch back"),
    }
    session.scope = Scope::Guardian;
}
