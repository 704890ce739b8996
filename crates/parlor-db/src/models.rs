/// Database row types. Distinct from parlor-types models so the password
/// hash never reaches the wire types.
pub struct AccountRow {
    pub username: String,
    pub password_hash: String,
}
