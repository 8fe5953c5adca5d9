//! Home page.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

use crate::middleware::OptionalAuth;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub signed_in: bool,
    pub name: String,
}

/// Display the home page. Public; greets a signed-in member by name.
#[instrument(skip(view))]
pub async fn home(OptionalAuth(view): OptionalAuth) -> HomeTemplate {
    let name = view
        .identity()
        .map(|identity| identity.name.clone())
        .unwrap_or_default();

    HomeTemplate {
        signed_in: view.is_authenticated(),
        name,
    }
}
