/// Store writes performed by the dashboard
use log::info;
use time::OffsetDateTime;

use crate::models::{DeviceRegistration, Profile};
use crate::remote::connection::{RemoteError, RemoteStore};

/// Path of the registration record for a device serial.
pub fn device_path(serial: &str) -> String {
    format!("devices/{}", serial)
}

/// Record the device owner under `devices/<serial>`
///
/// Overwrites whatever was stored for that serial before. `registeredAt` is
/// the current time in epoch milliseconds.
pub async fn store_device_registration(
    store: &RemoteStore,
    profile: &Profile,
) -> Result<(), RemoteError> {
    let record = DeviceRegistration {
        name: profile.name.clone(),
        email: profile.email.clone(),
        registered_at: (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
    };

    store.put_value(&device_path(&profile.serial), &record).await?;
    info!("Registered serial: {}", profile.serial);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn writes_name_email_and_timestamp() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/devices/ABCDEF123456.json")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "name": "Ada",
                    "email": "ada@example.com"
                })),
                Matcher::Regex(r#""registeredAt":\d{13}"#.to_string()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let store = RemoteStore::new(&server.url(), None).unwrap();
        let profile = Profile {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            serial: "ABCDEF123456".into(),
        };
        store_device_registration(&store, &profile).await.unwrap();
        mock.assert_async().await;
    }
}
