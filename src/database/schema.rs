/// Idempotent DDL, applied in order inside one transaction.
/// Sorted text columns use the "C" collation: code point order, the same
/// order the in-memory store uses.
pub const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS accounts (
        id UUID PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        name VARCHAR(255) NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_staff BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tags (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        name VARCHAR(255) COLLATE "C" NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS ingredients (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        name VARCHAR(255) COLLATE "C" NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipes (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        title VARCHAR(255) COLLATE "C" NOT NULL,
        time_minutes INTEGER NOT NULL,
        price NUMERIC(5, 2) NOT NULL,
        link VARCHAR(255) NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipe_tags (
        recipe_id UUID NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (recipe_id, tag_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS recipe_ingredients (
        recipe_id UUID NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
        ingredient_id UUID NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
        PRIMARY KEY (recipe_id, ingredient_id)
    )"#,
    "CREATE INDEX IF NOT EXISTS tags_user_id_idx ON tags (user_id)",
    "CREATE INDEX IF NOT EXISTS ingredients_user_id_idx ON ingredients (user_id)",
    "CREATE INDEX IF NOT EXISTS recipes_user_id_idx ON recipes (user_id)",
];
