//! Login resolution via the `GetUserID` operation.

use chatlog_types::{Login, UserId};
use serde::Deserialize;
use serde_json::json;

use crate::{GqlClient, GqlError, Operation};

const GET_USER_ID: Operation = Operation {
    name: "GetUserID",
    hash: "bf6c594605caa0c63522f690156aa04bd434870bf963deb76668c381d16fcaa5",
};

#[derive(Deserialize)]
struct Envelope {
    data: Payload,
}

#[derive(Deserialize)]
struct Payload {
    user: Option<User>,
}

#[derive(Deserialize)]
struct User {
    id: String,
}

/// Resolve a login to its user id.
///
/// `Ok(None)` means the endpoint answered but knows no such login, distinct
/// from transport or auth failures.
pub async fn user_id_by_login(
    client: &GqlClient,
    login: &Login,
) -> Result<Option<UserId>, GqlError> {
    let variables = json!({
        "login": login.as_str(),
        "lookupType": "ACTIVE",
    });

    let value = client.execute(GET_USER_ID, variables).await?;
    let envelope: Envelope =
        serde_json::from_value(value).map_err(|_| GqlError::MissingData("data.user"))?;

    Ok(envelope.data.user.map(|user| UserId::new(user.id)))
}
