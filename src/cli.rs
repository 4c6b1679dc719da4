use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use envbind::{
    write_env_template, EnvRecord, EnvTemplateOptions, FieldDescriptions, Loader,
};

#[derive(EnvRecord, Default, Debug)]
#[env(descriptions)]
pub struct ClientCredentials {
    #[env(",required")]
    pub client_id: String,
    pub client_secret: String,
}

impl FieldDescriptions for ClientCredentials {
    fn field_descriptions(&self) -> HashMap<String, String> {
        let mut docs = HashMap::new();
        docs.insert(
            "client_id".to_string(),
            "The client id as provided by the IAM server.".to_string(),
        );
        docs.insert(
            "client_secret".to_string(),
            "The client secret as provided by the IAM server.".to_string(),
        );
        docs
    }
}

#[derive(EnvRecord, Default, Debug)]
pub struct ModuleConfig {
    pub name: String,
    pub enabled: bool,
}

#[derive(EnvRecord, Default, Debug)]
pub struct ServiceClientConfig {
    pub server_base_url: String,
    #[env("&")]
    pub credentials: ClientCredentials,
    pub timeout: Duration,
    pub retry_delay: Option<Duration>,
    #[env(",map")]
    pub modules: BTreeMap<String, ModuleConfig>,
}

fn skeleton() -> ServiceClientConfig {
    let mut cfg = ServiceClientConfig {
        timeout: Duration::from_secs(20),
        ..Default::default()
    };
    cfg.modules
        .insert("billing".to_string(), ModuleConfig::default());
    cfg
}

fn main() {
    dotenvy::dotenv().ok();
    match std::env::args().nth(1) {
        Some(arg) => match arg.as_str() {
            "load" => load_config(),
            "template" => generate_template(false),
            "template-values" => generate_template(true),
            _ => println!(
                "unknown arg: {}. Available: load, template, template-values",
                arg
            ),
        },
        None => {
            println!("Usage: util-cli [command]");
            println!("Commands:");
            println!("  load            - Load the demo config from DEMO_* variables");
            println!("  template        - Print a commented env-file template");
            println!("  template-values - Same, with skeleton values filled in");
        }
    };
}

fn load_config() {
    let mut cfg = skeleton();
    match Loader::default().load("DEMO_", &mut cfg) {
        Ok(()) => {
            println!("Config loaded successfully!");
            println!("  server_base_url: {}", cfg.server_base_url);
            println!("  client_id: {}", cfg.credentials.client_id);
            println!("  timeout: {:?}", cfg.timeout);
            println!("  retry_delay: {:?}", cfg.retry_delay);
            for (name, module) in &cfg.modules {
                println!("  module {}: {:?}", name, module);
            }
        }
        Err(err) => {
            eprintln!("Failed to load config:");
            eprintln!("\t- {}", err);
        }
    }
}

fn generate_template(include_values: bool) {
    let mut cfg = skeleton();
    let opts = EnvTemplateOptions {
        field_prefix: "DEMO_".to_string(),
        include_skeleton_values: include_values,
        ..Default::default()
    };
    if let Err(err) = write_env_template(&mut std::io::stdout(), &mut cfg, &opts) {
        eprintln!("Failed to write template: {}", err);
    }
}
