use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use server::discord::DiscordProfile;
use server::entity::user;
use server::handlers::auth::upsert_login;

use crate::common::{TestApp, routes};

fn profile(discord_id: &str, username: &str) -> DiscordProfile {
    DiscordProfile {
        id: discord_id.to_string(),
        username: username.to_string(),
        discriminator: Some("0001".to_string()),
        avatar: Some("a_1b2c3d4e".to_string()),
    }
}

mod login_upsert {
    use super::*;

    #[tokio::test]
    async fn first_login_creates_the_user() {
        let app = TestApp::spawn().await;

        let user = upsert_login(&app.db, &profile("123456789012345678", "Dyslex1k"))
            .await
            .unwrap();

        assert_eq!(user.discord_id, "123456789012345678");
        assert_eq!(user.username, "Dyslex1k");
        assert!(user.last_login.is_some());
    }

    #[tokio::test]
    async fn second_login_reuses_the_row_and_refreshes_last_login() {
        let app = TestApp::spawn().await;
        let discord_id = "223456789012345678";

        let first = upsert_login(&app.db, &profile(discord_id, "Dyslex1k"))
            .await
            .unwrap();
        let second = upsert_login(&app.db, &profile(discord_id, "Dyslex1k_renamed"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "Dyslex1k_renamed");
        assert!(second.last_login.unwrap() >= first.last_login.unwrap());

        let rows = user::Entity::find()
            .filter(user::Column::DiscordId.eq(discord_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn concurrent_first_logins_land_on_one_row() {
        let app = TestApp::spawn().await;
        let discord_id = "323456789012345678";

        let first = profile(discord_id, "Racer");
        let second = profile(discord_id, "Racer");
        let (a, b) = tokio::join!(
            upsert_login(&app.db, &first),
            upsert_login(&app.db, &second),
        );

        assert_eq!(a.unwrap().id, b.unwrap().id);
    }
}

mod endpoints {
    use super::*;

    #[tokio::test]
    async fn login_url_points_at_discord_with_the_client_id() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::LOGIN).await;

        assert_eq!(res.status, 200);
        let url = res.body["url"].as_str().unwrap();
        assert!(url.starts_with("https://discord.com/api/oauth2/authorize"));
        assert!(url.contains("client_id=test-client-id"));
    }

    #[tokio::test]
    async fn me_returns_the_authenticated_user() {
        let app = TestApp::spawn().await;
        let (user_id, token) = app.create_user("Dyslex1k").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], user_id.to_string());
        assert_eq!(res.body["username"], "Dyslex1k");
    }

    #[tokio::test]
    async fn me_without_a_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn me_with_a_garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
