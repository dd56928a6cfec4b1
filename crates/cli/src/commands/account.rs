//! Account, contact, and consent commands.

use foodcourt_client::{AppState, ClientError};
use foodcourt_core::{ContactForm, SignupForm};

use super::CommandError;

pub async fn login(state: &mut AppState, username: &str, password: &str) -> Result<(), CommandError> {
    let user = state.login(username, password).await?;
    println!("Logged in as {} ({})", user.username, user.role);
    Ok(())
}

pub async fn signup(
    state: &mut AppState,
    username: String,
    email: String,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    let form = SignupForm {
        username,
        email,
        password,
        confirm_password,
    };
    let user = state.signup(&form).await?;
    println!("Welcome, {}! Your account is ready.", user.username);
    Ok(())
}

pub async fn logout(state: &mut AppState) -> Result<(), CommandError> {
    state.logout().await?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(state: &AppState) {
    match state.user() {
        Some(user) => {
            println!("{} <{}>", user.username, user.email);
            println!("  role: {}", user.role);
            if let Some(address) = &user.address {
                println!("  address: {address}");
            }
        }
        None => println!("Not logged in"),
    }
    match state.cookie_consent() {
        Some(true) => println!("Error reporting: accepted"),
        Some(false) => println!("Error reporting: declined"),
        None => println!("Error reporting: not decided (fc-cli consent accept|decline)"),
    }
}

pub async fn contact(
    state: &AppState,
    name: String,
    email: String,
    subject: String,
    message: String,
    phone: Option<&str>,
) -> Result<(), CommandError> {
    let form = ContactForm {
        name,
        email,
        subject,
        message,
    };
    state.contact(&form, phone).await?;
    println!("Message sent. We will get back to you soon.");
    Ok(())
}

pub async fn users(state: &AppState) -> Result<(), CommandError> {
    let users = state.api().users().await.map_err(ClientError::from)?;
    for user in users {
        let active = if user.active { "" } else { " (disabled)" };
        println!("{:>5}  {:<20} {:<30} {}{active}", user.id.as_i64(), user.username, user.email, user.role);
    }
    Ok(())
}

pub fn consent(state: &mut AppState, accepted: bool) {
    state.set_cookie_consent(accepted);
    if accepted {
        println!("Error reporting enabled");
    } else {
        println!("Error reporting disabled");
    }
}
