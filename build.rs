fn main() {
    // Baked into the default backend address (see `config::DEFAULT_API_URL`).
    println!("cargo:rerun-if-env-changed=SENSORNODE_API_URL");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
