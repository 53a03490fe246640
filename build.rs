fn main() {
    // ESP-IDF environment passthrough. Host test builds have no IDF
    // environment to forward, so skip it unless the feature is on.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
