/**
 * Chat Probe
 *
 * Signs in with an existing session cookie, loads the contact list and the
 * user directory, and prints a summary. Useful to check a deployment's chat
 * endpoints from a terminal.
 *
 * Environment:
 *   CLIENT_API_URL   server URL (overrides the config file)
 *   CHAT_SESSION     value of the portal session cookie
 *   CHAT_USER_ID     id of the signed-in user
 *   CHAT_CONFIG      path of a TOML config file
 */
use campus_chat::client::messaging::{filter_directory, ContactActions, DirectoryFilter, UserView};
use campus_chat::client::{ChatController, Config, HttpChatApi};
use campus_chat::shared::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "campus_chat=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let app = match std::env::var("CHAT_CONFIG").ok().map(std::path::PathBuf::from) {
        Some(path) => AppConfig::load_from_file(path)?,
        None => match AppConfig::default_path().filter(|p| p.exists()) {
            Some(path) => AppConfig::load_from_file(path)?,
            None => AppConfig::default(),
        },
    };

    let mut config = Config::from_app(app);
    config.set_session(std::env::var("CHAT_SESSION").ok());
    let user_id = std::env::var("CHAT_USER_ID").ok().and_then(|v| v.parse().ok());
    config.set_current_user(user_id);

    tracing::info!("[PROBE] Using server {}", config.server_url());
    let app = config.app().clone();
    let controller = ChatController::new(HttpChatApi::new(config)?, &app, user_id);

    if let Err(e) = controller.refresh().await {
        tracing::error!("[PROBE] Refresh failed: {}", e);
        return Err(e.into());
    }

    let state = controller.read().await;
    println!("Contacts ({}):", state.contacts.len());
    for contact in &state.contacts {
        let actions = ContactActions::for_contact(contact);
        println!(
            "  {:>6}  {:<28} {:<12} unread={} {}",
            contact.contact_id,
            contact.name,
            contact.display_label(),
            contact.unread_count,
            if actions.can_accept { "[awaiting your answer]" } else { "" }
        );
    }

    let pending = filter_directory(
        &state.directory,
        &DirectoryFilter { view: UserView::Pending, ..Default::default() },
    );
    println!(
        "Directory: {} users, {} with pending requests",
        state.directory.len(),
        pending.len()
    );
    println!("Unread messages: {}", state.total_unread());

    Ok(())
}
