//! # CRD Generator
//!
//! Prints the `KafkaUser` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/kafkauser.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kafka_user_operator::crd::KafkaUser;
use kube::core::CustomResourceExt;

fn main() {
    let crd = KafkaUser::crd();

    match serde_yaml::to_string(&crd) {
        Ok(yaml) => {
            println!("# Generated by crdgen from src/crd; do not edit by hand");
            println!("---");
            print!("{yaml}");
        }
        Err(e) => {
            eprintln!("Failed to serialize CRD to YAML: {e}");
            std::process::exit(1);
        }
    }
}
