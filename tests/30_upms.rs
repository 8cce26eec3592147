mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{api, unique};

fn menu(name: &str, order_no: i32, parent_id: Option<&str>) -> serde_json::Value {
    json!({
        "path": format!("/{}", name),
        "name": name,
        "title": name,
        "orderNo": order_no,
        "parentId": parent_id,
    })
}

#[tokio::test]
async fn menus_nest_three_levels() -> Result<()> {
    let api = api().await?;
    let a = api.create("/api/v1/upms/menus", menu(&unique("m"), 1, None)).await?;
    let b = api.create("/api/v1/upms/menus", menu(&unique("m"), 1, a["id"].as_str())).await?;
    let c = api.create("/api/v1/upms/menus", menu(&unique("m"), 1, b["id"].as_str())).await?;
    assert_eq!(c["level"], 3);
    assert_eq!(c["keepAlive"], true);

    let (status, body) = api.post("/api/v1/upms/menus", menu(&unique("m"), 1, c["id"].as_str())).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DEPTH_EXCEEDED");

    let (status, body) = api.get(&format!("/api/v1/upms/menus/{}", c["id"].as_str().unwrap())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ancestors"].as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn role_bindings_and_menu_forest() -> Result<()> {
    let api = api().await?;
    let parent = api.create("/api/v1/upms/menus", menu(&unique("sys"), 2, None)).await?;
    let child = api.create("/api/v1/upms/menus", menu(&unique("usr"), 1, parent["id"].as_str())).await?;
    let role = api.create("/api/v1/upms/roles", json!({ "name": unique("role") })).await?;
    let role_id = role["id"].as_str().unwrap();

    let (status, body) = api
        .put(&format!("/api/v1/upms/roles/{}/menus", role_id), json!({ "menuIds": [child["id"]] }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let forest = body["data"].as_array().unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0]["id"], parent["id"]);
    assert_eq!(forest[0]["children"][0]["id"], child["id"]);

    let (status, body) = api.delete(&format!("/api/v1/upms/menus/{}", child["id"].as_str().unwrap())).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "HAS_DEPENDENTS");

    let account = api.account(&unique("acct")).await?;
    let ids = json!({ "accountIds": [account["id"]] });
    let (status, body) = api.post(&format!("/api/v1/upms/roles/{}/accounts", role_id), ids.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accountIds"].as_array().unwrap().len(), 1);

    let (status, body) = api.delete(&format!("/api/v1/upms/roles/{}", role_id)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "HAS_DEPENDENTS");

    let (status, _) = api.delete_with(&format!("/api/v1/upms/roles/{}/accounts", role_id), ids).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = api.delete(&format!("/api/v1/upms/roles/{}", role_id)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // menu bindings went with the role
    let (status, _) = api.delete(&format!("/api/v1/upms/menus/{}", child["id"].as_str().unwrap())).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn role_names_are_alphanumeric() -> Result<()> {
    let (status, body) = api().await?.post("/api/v1/upms/roles", json!({ "name": "not valid!" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["name"].is_string());
    Ok(())
}

#[tokio::test]
async fn permissions_page_by_role() -> Result<()> {
    let api = api().await?;
    let role = api.create("/api/v1/upms/roles", json!({ "name": unique("perm") })).await?;
    let role_id = role["id"].as_str().unwrap();
    for i in 0..3 {
        api.create(
            "/api/v1/upms/permissions",
            json!({ "name": unique(&format!("p{}", i)), "roleId": role_id, "resource": "/api/v1/users", "action": "read" }),
        )
        .await?;
    }

    let (status, body) = api
        .get(&format!("/api/v1/upms/permissions?roleId={}&pageNumber=1&pageSize=2&sort=ASC", role_id))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["totalPage"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);

    for far in ["300000000", "9223372036854775807"] {
        let (status, body) = api
            .get(&format!("/api/v1/upms/permissions?roleId={}&pageNumber={}&pageSize=10", role_id, far))
            .await?;
        assert_eq!(status, StatusCode::OK, "pageNumber={}: {}", far, body);
        assert_eq!(body["data"]["total"], 3);
        assert!(body["data"]["data"].as_array().unwrap().is_empty());
    }

    let (status, body) = api
        .post(
            "/api/v1/upms/permissions",
            json!({ "name": unique("x"), "roleId": uuid::Uuid::new_v4(), "resource": "/x", "action": "write" }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);
    Ok(())
}
