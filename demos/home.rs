use std::sync::Arc;

use fabric_config::fabric::{ConfigurationPackage, Parameter, ProtectedString, Section};
use fabric_config::{AppContext, Config, ConfigError, MemoryActivationContext};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MyOptions {
    my_config_section: MyConfigSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MyConfigSection {
    my_parameter: String,
    #[allow(dead_code)]
    api_key: String,
}

/// Renders one field of the options it was constructed with.
struct HomeController {
    options: Arc<MyOptions>,
}

impl HomeController {
    fn new(options: Arc<MyOptions>) -> Self {
        Self { options }
    }

    fn index(&self) -> String {
        format!("Message: {}", self.options.my_config_section.my_parameter)
    }
}

// Stand-in for the runtime's certificate-based decryption.
fn rot13(ciphertext: &str) -> Result<Option<ProtectedString>, ConfigError> {
    let plaintext: String = ciphertext
        .chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect();
    Ok(Some(ProtectedString::from_plaintext(&plaintext)))
}

fn package(version: &str, message: &str) -> ConfigurationPackage {
    ConfigurationPackage::new("Config", version)
        .with_section(
            Section::new("MyConfigSection")
                .with_parameter(Parameter::new("MyParameter", message))
                .with_parameter(Parameter::encrypted("ApiKey", "fhcre-frperg")),
        )
        .with_decryptor(rot13)
}

fn main() -> Result<(), fabric_config::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let host = Arc::new(MemoryActivationContext::new());
    host.insert_package(package("1.0", "Hello from the configuration package"));

    let ctx = AppContext::builder()
        .with_config(
            Config::builder()
                .with_memory([("MyConfigSection:MyParameter", "default message")])
                .with_env("WEB1", "__")
                .with_fabric_package(host.clone(), "Config")
                .build()?,
        )
        .build::<MyOptions>()?;

    println!("{}", HomeController::new(ctx.options()).index());

    host.replace_package(package("2.0", "Hello after the upgrade"));

    println!("{}", HomeController::new(ctx.options()).index());

    Ok(())
}
