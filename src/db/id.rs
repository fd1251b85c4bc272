use ulid::Ulid;

pub fn create_id() -> String {
    Ulid::new().to_string()
}

pub fn create_token() -> String {
    format!("{}{}", Ulid::new(), Ulid::new()).to_lowercase()
}
