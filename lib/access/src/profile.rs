//! Public profile of the current caller.

use serde::{Deserialize, Serialize};

use crate::error::NotAuthenticated;
use crate::principal::Principal;

/// Profile fields safe to return to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub name: String,
    pub login: String,
    /// The provider's account id.
    pub id: Option<i64>,
    pub email: String,
}

/// Maps a principal into its profile view.
///
/// # Errors
///
/// Returns `NotAuthenticated` when there is no principal.
pub fn project(principal: Option<&Principal>) -> Result<ProfileView, NotAuthenticated> {
    let display = principal.ok_or(NotAuthenticated)?.display();
    Ok(ProfileView {
        name: display.name.clone(),
        login: display.login.clone(),
        id: display.subject_id.map(|id| id.get()),
        email: display.email.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::PrincipalBuilder;
    use crate::principal::tests::identity;
    use crate::provider::{AccessToken, ProviderAttributes};
    use crate::role::Role;
    use serde_json::json;

    #[test]
    fn absent_principal_is_not_authenticated() {
        assert_eq!(project(None), Err(NotAuthenticated));
    }

    #[test]
    fn projects_display_attributes_without_token() {
        let attrs = ProviderAttributes::from_value(json!({
            "email": "a@x.com",
            "name": "Ann",
            "login": "ann",
            "id": 101
        }))
        .unwrap();
        let principal = PrincipalBuilder.build(
            &identity(1, "a@x.com", Some("Ann"), Role::Standard),
            &attrs,
            AccessToken::new("gho_secret"),
        );

        let view = project(Some(&principal)).unwrap();

        assert_eq!(
            view,
            ProfileView {
                name: "Ann".to_string(),
                login: "ann".to_string(),
                id: Some(101),
                email: "a@x.com".to_string(),
            }
        );
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("gho_secret"));
    }
}
