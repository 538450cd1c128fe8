//! Walks through a Google login from the terminal.
//!
//! Reads `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` and `GOOGLE_REDIRECT_URL`
//! (a `.env` file works too), prints the authorization URL, then asks for the
//! `code` query parameter Google appends to the redirect.

use ras_identity_google::{GoogleConfig, GoogleProvider, OAuthProvider};
use std::io::{self, BufRead, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = GoogleConfig::from_env()?.with_scopes(["openid", "email", "profile"]);
    let mut provider = GoogleProvider::from_config(config);
    provider.set_prompt(["select_account"]);

    let mut session = provider.begin_auth("demo-state")?;

    println!("Google OAuth2 login");
    println!("===================");
    println!("\nOpen this URL in your browser:\n\n{}\n", session.get_auth_url()?);
    print!("Paste the `code` parameter from the redirect: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;

    session.authorize(&provider, code.trim()).await?;
    let user = provider.fetch_user(&session).await?;

    println!("\nSigned in as {} <{}>", user.name, user.email);
    println!("User ID: {}", user.user_id);
    if let Some(expires_at) = user.expires_at {
        println!("Access token expires at {}", expires_at);
    }

    if !session.refresh_token.is_empty() {
        let token = provider.refresh_token(&session.refresh_token).await?;
        println!("Refreshed access token, new expiry: {:?}", token.expiry);
    }

    Ok(())
}
