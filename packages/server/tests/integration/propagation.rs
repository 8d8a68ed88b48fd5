use serde_json::json;
use uuid::Uuid;

use server::graph::GraphStore;
use server::projection::build_relationship_edges;

use crate::common::{TestApp, routes, sample_prefab};

mod degraded_success {
    use super::*;

    #[tokio::test]
    async fn create_with_the_search_index_down_still_returns_the_id() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        app.search.set_failing(true);

        let res = app
            .post_with_token(routes::PREFABS, &sample_prefab("Unindexed"), &token)
            .await;

        assert_eq!(res.status, 201, "degraded create failed: {}", res.text);
        assert_eq!(res.body["pending_propagation"], json!(["search_index"]));
        let id = res.id();

        // Canonical truth exists and the graph side still went through.
        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.status, 200);
        assert!(!app.graph.edges_for(&id).is_empty());
        assert!(app.search.get(&id).is_none());
    }

    #[tokio::test]
    async fn create_with_both_derived_stores_down_reports_both_stages() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        app.search.set_failing(true);
        app.graph.set_failing(true);

        let res = app
            .post_with_token(routes::PREFABS, &sample_prefab("Orphaned"), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(
            res.body["pending_propagation"],
            json!(["search_index", "graph"])
        );

        let res = app.get(&routes::prefab(&res.id())).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn update_with_the_graph_down_still_applies_the_patch() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "Before").await;
        app.graph.set_failing(true);

        let res = app
            .patch_with_token(&routes::prefab(&id), &json!({"name": "After"}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["pending_propagation"], json!(["graph"]));

        let res = app.get(&routes::prefab(&id)).await;
        assert_eq!(res.body["name"], "After");
        // The search rebuild was unaffected by the graph failure.
        assert_eq!(app.search.get(&id).unwrap().name, "After");
    }

    #[tokio::test]
    async fn search_reads_fail_hard_when_the_backend_is_down() {
        let app = TestApp::spawn().await;
        app.search.set_failing(true);

        let res = app.get(&format!("{}?q=anything", routes::SEARCH)).await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
    }
}

mod graph_consistency {
    use super::*;

    #[tokio::test]
    async fn applying_the_same_edge_set_twice_changes_nothing() {
        let app = TestApp::spawn().await;
        let edges = build_relationship_edges(
            Uuid::now_v7(),
            &["Avatars".into()],
            &["Animations".into(), "Tooling".into()],
            &["hands".into()],
        );

        app.graph.apply_edges(&edges).await.unwrap();
        let nodes_after_first = app.graph.node_count();
        let edges_after_first = app.graph.edge_count();

        app.graph.apply_edges(&edges).await.unwrap();

        assert_eq!(app.graph.node_count(), nodes_after_first);
        assert_eq!(app.graph.edge_count(), edges_after_first);
    }

    #[tokio::test]
    async fn create_links_the_prefab_to_its_taxonomy() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;

        let id = app.create_prefab(&token, "Linked").await;

        let edges = app.graph.edges_for(&id);
        // 1 use case + 2 categories + 2 tags from the sample payload.
        assert_eq!(edges.len(), 5);
        assert!(app.graph.has_node("UseCase", "Avatars"));
        assert!(app.graph.has_node("Category", "Tooling"));
        assert!(app.graph.has_node("Tag", "osc"));
    }

    #[tokio::test]
    async fn update_prunes_edges_for_removed_taxonomy_entries() {
        let app = TestApp::spawn().await;
        let (_, token) = app.create_user("Dyslex1k").await;
        let id = app.create_prefab(&token, "Retagged").await;

        let res = app
            .patch_with_token(
                &routes::prefab(&id),
                &json!({"tags": ["osc", "tracking"]}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);

        let tags: Vec<String> = app
            .graph
            .edges_for(&id)
            .into_iter()
            .filter(|edge| edge.relation.rel_type() == "HAS_TAG")
            .map(|edge| edge.target)
            .collect();

        assert!(tags.contains(&"osc".to_string()));
        assert!(tags.contains(&"tracking".to_string()));
        assert!(!tags.contains(&"hands".to_string()));
    }
}
