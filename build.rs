fn main() {
    // Build-time configuration defaults (read through `option_env!` in config.rs).
    for var in [
        "HCC_ONEWIRE_ENABLED",
        "HCC_A4988_ENABLED",
        "HCC_ONEWIRE_GPIO",
        "HCC_MAX_DEVICES",
        "HCC_POLL_SECS",
        "HCC_RESOLUTION",
        "HCC_SETTLE_MS",
        "HCC_PUB_ROOT",
        "HCC_BROKER_URL",
        "HCC_WIFI_SSID",
        "HCC_WIFI_PASSWORD",
        "HCC_CONFIG_JSON",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
