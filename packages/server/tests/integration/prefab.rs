use serde_json::json;

use crate::common::{TestApp, routes, sample_prefab};

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = TestApp::spawn().await;
        let (user_id, token) = app.create_user("Dyslex1k").await;

        let res = app
            .post_with_token(routes::PREFABS, &sample_prefab("SkeletalHands"), &token)
            .await;
        assert_eq!(res.status, 201, "create failed: {}", res.text);
        assert_eq!(res.body["pending_propagation"], json!([]));
        let id = res.id();

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["name"], "SkeletalHands");
        assert_eq!(res.body["use_cases"], json!(["Avatars"]));
        assert_eq!(res.body["categories"], json!(["Animations", "Tooling"]));
        assert_eq!(res.body["tags"], json!(["hands", "osc"]));
        assert_eq!(res.body["licence_type"], "Open Source");
        assert_eq!(res.body["is_free"], true);
        assert_eq!(res.body["creator_id"], user_id.to_string());
        assert!(res.body["created_at"].is_string());
        assert!(res.body["updated_at"].is_null());
    }

    #[tokio::test]
    async fn create_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::PREFABS, &sample_prefab("NoAuth"))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn create_rejects_more_than_two_use_cases() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let mut body = sample_prefab("TooManyUseCases");
        body["use_cases"] = json!(["Worlds", "Avatars", "Osc"]);

        let res = app.post_with_token(routes::PREFABS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_a_malformed_link_url() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let mut body = sample_prefab("BadLink");
        body["external_links"] = json!([{"type": "Booth", "url": "not a url"}]);

        let res = app.post_with_token(routes::PREFABS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn create_rejects_an_overlong_description() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let mut body = sample_prefab("LongDescription");
        body["description"] = json!("x".repeat(401));

        let res = app.post_with_token(routes::PREFABS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let first = sample_prefab("First");
        let second = sample_prefab("Second");
        let (a, b) = tokio::join!(
            app.post_with_token(routes::PREFABS, &first, &token),
            app.post_with_token(routes::PREFABS, &second, &token),
        );

        assert_eq!(a.status, 201);
        assert_eq!(b.status, 201);
        assert_ne!(a.id(), b.id());
    }
}

mod reads {
    use super::*;

    #[tokio::test]
    async fn get_with_a_malformed_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::prefab("not-a-uuid")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn get_a_missing_prefab_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::prefab("00000000-0000-7000-8000-000000000000"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        for name in ["Alpha", "Beta", "Gamma"] {
            app.create_prefab(&token, name).await;
        }

        let res = app
            .get(&format!("{}?page=1&per_page=2", routes::PREFABS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 2);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }

    #[tokio::test]
    async fn search_finds_a_created_prefab_by_name() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "SkeletalHands").await;

        let res = app
            .get(&format!("{}?q=SkeletalHands", routes::SEARCH))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["results"][0]["id"], id);
        assert_eq!(res.body["results"][0]["creator"]["username"], "Dyslex1k");
        assert!(res.body["results"][0]["score"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn search_applies_facet_filters_conjunctively() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        app.create_prefab(&token, "FreeHands").await;
        let mut paid = sample_prefab("PaidHands");
        paid["is_free"] = json!(false);
        paid["licence_type"] = json!("Proprietary");
        let res = app.post_with_token(routes::PREFABS, &paid, &token).await;
        assert_eq!(res.status, 201);

        let res = app
            .get(&format!("{}?q=Hands&is_free=false", routes::SEARCH))
            .await;
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["results"][0]["name"], "PaidHands");

        let res = app
            .get(&format!(
                "{}?q=Hands&is_free=false&licence_type=Open%20Source",
                routes::SEARCH
            ))
            .await;
        assert_eq!(res.body["total"], 0);

        let res = app
            .get(&format!("{}?q=Hands&use_cases=Worlds", routes::SEARCH))
            .await;
        assert_eq!(res.body["total"], 0);
    }

    #[tokio::test]
    async fn search_total_is_independent_of_the_page_window() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        for name in ["HandsOne", "HandsTwo", "HandsThree"] {
            app.create_prefab(&token, name).await;
        }

        let res = app
            .get(&format!("{}?q=Hands&limit=1&offset=1", routes::SEARCH))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 3);
        assert_eq!(res.body["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_requires_a_term() {
        let app = TestApp::spawn().await;

        let res = app.get(&format!("{}?q=%20", routes::SEARCH)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn an_empty_patch_is_rejected_before_any_store_is_touched() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "Untouched").await;

        let res = app
            .patch_with_token(&routes::prefab(&id), &json!({}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "Untouched");
        assert!(res.body["updated_at"].is_null());
    }

    #[tokio::test]
    async fn update_by_a_non_creator_is_indistinguishable_from_missing() {
        let app = TestApp::spawn().await;
        let (_, creator_token) = app.create_user("creator").await;
        let (_, other_token) = app.create_user("someone_else").await;
        let id = app.create_prefab(&creator_token, "Original").await;

        let res = app
            .patch_with_token(&routes::prefab(&id), &json!({"name": "Hijacked"}), &other_token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "Original");
    }

    #[tokio::test]
    async fn update_patches_only_the_supplied_fields() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "BeforePatch").await;

        let res = app
            .patch_with_token(
                &routes::prefab(&id),
                &json!({"name": "AfterPatch", "is_free": false}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["pending_propagation"], json!([]));

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "AfterPatch");
        assert_eq!(res.body["is_free"], false);
        // Untouched fields keep their stored values.
        assert_eq!(res.body["tags"], json!(["hands", "osc"]));
        assert_eq!(res.body["categories"], json!(["Animations", "Tooling"]));
        assert!(res.body["updated_at"].is_string());
    }

    #[tokio::test]
    async fn update_with_a_malformed_id_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let res = app
            .patch_with_token(&routes::prefab("nope"), &json!({"name": "X"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_by_a_non_creator_is_indistinguishable_from_missing() {
        let app = TestApp::spawn().await;
        let (_, creator_token) = app.create_user("creator").await;
        let (_, other_token) = app.create_user("someone_else").await;
        let id = app.create_prefab(&creator_token, "Permanent").await;

        let res = app.delete_with_token(&routes::prefab(&id), &other_token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn delete_removes_the_record_everywhere() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "Ephemeral").await;
        assert!(app.search.get(&id).is_some());

        let res = app.delete_with_token(&routes::prefab(&id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.status, 404);

        assert!(app.search.get(&id).is_none());
        assert!(app.graph.edges_for(&id).is_empty());
        assert!(!app.graph.has_node("Prefab", &id));
    }
}

mod lifecycle {
    use super::*;

    /// End-to-end pass over the whole write surface: create, discover,
    /// reject a non-creator, patch, delete, and observe every store agree.
    #[tokio::test]
    async fn create_update_delete_scenario() {
        let app = TestApp::spawn().await;
        let (_, u1) = app.create_user("u1").await;
        let (_, u2) = app.create_user("u2").await;

        // create "A" as u1, discoverable by search
        let id = app.create_prefab(&u1, "A").await;
        let res = app.get(&format!("{}?q=A", routes::SEARCH)).await;
        assert_eq!(res.body["total"], 1);

        // u2 cannot rename it
        let res = app
            .patch_with_token(&routes::prefab(&id), &json!({"name": "B"}), &u2)
            .await;
        assert_eq!(res.status, 404);
        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "A");

        // u1 renames it; updated_at flips to non-null
        let res = app
            .patch_with_token(&routes::prefab(&id), &json!({"name": "B"}), &u1)
            .await;
        assert_eq!(res.status, 200);
        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "B");
        assert!(res.body["updated_at"].is_string());

        // the index was rebuilt wholesale from the new canonical truth
        let doc = app.search.get(&id).unwrap();
        assert_eq!(doc.name, "B");

        // u1 deletes it; nothing is left behind
        let res = app.delete_with_token(&routes::prefab(&id), &u1).await;
        assert_eq!(res.status, 204);
        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.status, 404);
        let res = app.get(&format!("{}?q=B", routes::SEARCH)).await;
        assert_eq!(res.body["total"], 0);
    }
}
