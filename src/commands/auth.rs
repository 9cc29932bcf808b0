use crate::error::AppResult;
use crate::services::validation::{LoginForm, SignupForm};
use crate::AppState;

pub async fn signup(state: &mut AppState, form: SignupForm) -> AppResult<String> {
    let user = state.session.signup(&form).await?;
    Ok(format!("Signed up as {} <{}>", user.username, user.email))
}

pub async fn login(state: &mut AppState, form: LoginForm) -> AppResult<String> {
    let user = state.session.login(&form).await?;
    Ok(format!("Logged in as {} <{}>", user.username, user.email))
}

pub fn logout(state: &mut AppState) -> AppResult<String> {
    state.session.logout()?;
    Ok("Logged out".to_string())
}

pub fn whoami(state: &AppState) -> String {
    if !state.session.is_logged_in() {
        return "Not logged in".to_string();
    }
    let user = state.session.user();
    let owned = state.store.events_owned_by(user);
    let mut out = format!("{} <{}>", user.username, user.email);
    if !owned.is_empty() {
        out.push_str(&format!(", {} event(s) created", owned.len()));
    }
    out
}
