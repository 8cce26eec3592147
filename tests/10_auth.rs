mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{api, encode, refresh_token, unique};

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let api = api().await?.anonymous();

    let (status, body) = api.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "memory");

    let (status, body) = api.get("/").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "UPMS API");
    Ok(())
}

#[tokio::test]
async fn protected_routes_need_an_access_token() -> Result<()> {
    let (status, body) = api().await?.anonymous().get("/api/v1/users/organizations").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = api().await?.with_token(refresh_token()).get("/api/v1/users/organizations").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = api().await?.with_token("not.a.jwt").get("/api/v1/upms/menus").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn first_login_requires_password_change() -> Result<()> {
    let admin = api().await?;
    let login = unique("user");
    let created = admin.account(&login).await?;
    let initial = created["initialPassword"].as_str().unwrap().to_string();
    assert!(created.get("passwordHash").is_none());

    let public = api().await?.anonymous();

    let (status, body) = public
        .post("/api/v1/auth/login", json!({ "account": login, "password": encode("wrong-password") }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let (status, body) = public
        .post("/api/v1/auth/login", json!({ "account": login, "password": encode(&initial) }))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PASSWORD_RESET_REQUIRED");

    let fresh = "Fresh-passw0rd!";
    let (status, body) = public
        .post(
            "/api/v1/auth/password",
            json!({
                "account": login,
                "password": encode(&initial),
                "newPassword": encode(fresh),
                "reNewPassword": encode("Different-passw0rd!"),
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["reNewPassword"].is_string());

    let (status, _) = public
        .post(
            "/api/v1/auth/password",
            json!({
                "account": login,
                "password": encode(&initial),
                "newPassword": encode(fresh),
                "reNewPassword": encode(fresh),
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = public
        .post("/api/v1/auth/login", json!({ "account": login, "password": encode(fresh) }))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert!(body["data"]["account"]["lastLoginTime"].is_string());

    let me = api().await?.with_token(access);
    let (status, body) = me.get("/api/v1/auth/whoami").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"], login.as_str());
    assert_eq!(body["data"]["positionName"], "Engineer");

    let (status, body) = public.post("/api/v1/auth/refresh", json!({ "refreshToken": refresh })).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["accessToken"].is_string());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let (status, body) = api().await?.anonymous().post("/api/v1/auth/login", json!({ "account": "x" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
