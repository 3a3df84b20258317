/// One-time registration: validation, local save, remote device record
use log::{error, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::models::Profile;
use crate::profile::store::{ProfileStore, ProfileStoreError};
use crate::remote::{store_device_registration, RemoteError, RemoteStore};

/// Required device serial length, in characters.
pub const SERIAL_LENGTH: usize = 12;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Please enter name, email, and device serial")]
    MissingField,

    #[error("Device serial must be exactly 12 characters long.")]
    SerialLength(usize),

    #[error("Failed to save user info. Try again.")]
    LocalSave(#[source] ProfileStoreError),

    #[error("Failed to save user info. Try again.")]
    RemoteWrite(#[source] RemoteError),

    #[error("Registration input closed")]
    InputClosed,

    #[error("Registration prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Check the form fields and build the profile they describe.
pub fn validate(name: &str, email: &str, serial: &str) -> Result<Profile, RegistrationError> {
    if name.is_empty() || email.is_empty() || serial.is_empty() {
        return Err(RegistrationError::MissingField);
    }
    let length = serial.chars().count();
    if length != SERIAL_LENGTH {
        return Err(RegistrationError::SerialLength(length));
    }
    Ok(Profile {
        name: name.to_string(),
        email: email.to_string(),
        serial: serial.to_string(),
    })
}

/// Validate, save locally, then write the device record
///
/// Nothing is written unless validation passes. The two writes are not
/// transactional: a failed remote write leaves the local profile in place.
pub async fn register(
    profiles: &ProfileStore,
    remote: &RemoteStore,
    name: &str,
    email: &str,
    serial: &str,
) -> Result<Profile, RegistrationError> {
    let profile = validate(name, email, serial)?;

    profiles
        .save(&profile)
        .await
        .map_err(RegistrationError::LocalSave)?;

    store_device_registration(remote, &profile)
        .await
        .map_err(RegistrationError::RemoteWrite)?;

    Ok(profile)
}

async fn ask<R, W>(reader: &mut R, writer: &mut W, label: &str) -> Result<String, RegistrationError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("{}: ", label).as_bytes()).await?;
    writer.flush().await?;
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(RegistrationError::InputClosed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Interactive registration screen. Re-prompts until a registration succeeds.
pub async fn prompt_registration<R, W>(
    reader: &mut R,
    writer: &mut W,
    profiles: &ProfileStore,
    remote: &RemoteStore,
) -> Result<Profile, RegistrationError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(b"Welcome!\nPlease register to continue\n")
        .await?;

    loop {
        let name = ask(reader, writer, "Your Name").await?;
        let email = ask(reader, writer, "Your Email").await?;
        let serial = ask(reader, writer, "Device Serial").await?;

        match register(profiles, remote, &name, &email, &serial).await {
            Ok(profile) => {
                info!("Registration complete for {}", profile.serial);
                return Ok(profile);
            }
            Err(e @ (RegistrationError::MissingField | RegistrationError::SerialLength(_))) => {
                warn!("Registration rejected: {}", e);
                writer.write_all(format!("{}\n", e).as_bytes()).await?;
            }
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => error!("Error saving data: {}", cause),
                    None => error!("Error saving data: {}", e),
                }
                writer.write_all(format!("{}\n", e).as_bytes()).await?;
            }
        }
    }
}
