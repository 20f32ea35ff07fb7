//! Initial database migration.
//!
//! Creates the enums, users, accounts, transaction categories and
//! transactions tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: OWNERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: ORDERED ENTITIES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTION_CATEGORIES_SQL).await?;

        // ============================================================
        // PART 4: LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'CASH',
    'BANK',
    'CREDIT_CARD',
    'SAVINGS',
    'INVESTMENT',
    'I_OWE',
    'OWE_ME'
);

CREATE TYPE category_type AS ENUM ('INCOME', 'EXPENSE');

CREATE TYPE transaction_type AS ENUM (
    'TRANSFER',
    'EXPENSE',
    'INCOME',
    'BALANCE_CORRECTION'
);

CREATE TYPE entity_status AS ENUM ('ACTIVE', 'ARCHIVED');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    currency VARCHAR(3) NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    init_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    sort_order INTEGER,
    status entity_status NOT NULL DEFAULT 'ACTIVE',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_accounts_sort_order CHECK (sort_order >= 0),
    -- Active accounts hold a slot in their group, archived ones never do
    CONSTRAINT chk_accounts_slot CHECK ((status = 'ACTIVE') = (sort_order IS NOT NULL))
);

-- Ordering group lookup: (user, type), active only
CREATE INDEX idx_accounts_group ON accounts(user_id, account_type, sort_order) WHERE status = 'ACTIVE';

CREATE INDEX idx_accounts_user_status ON accounts(user_id, status);
";

const TRANSACTION_CATEGORIES_SQL: &str = r"
CREATE TABLE transaction_categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    category_type category_type NOT NULL,
    currency VARCHAR(3) NOT NULL,
    parent_id UUID REFERENCES transaction_categories(id) ON DELETE SET NULL,
    sort_order INTEGER,
    status entity_status NOT NULL DEFAULT 'ACTIVE',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_categories_sort_order CHECK (sort_order >= 0),
    CONSTRAINT chk_categories_slot CHECK ((status = 'ACTIVE') = (sort_order IS NOT NULL)),
    CONSTRAINT chk_categories_not_self_parent CHECK (parent_id IS NULL OR parent_id <> id)
);

-- Ordering group lookup: (user, type, parent), active only
CREATE INDEX idx_categories_group ON transaction_categories(user_id, category_type, parent_id, sort_order)
    WHERE status = 'ACTIVE';

CREATE INDEX idx_categories_parent ON transaction_categories(parent_id) WHERE parent_id IS NOT NULL;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    transaction_type transaction_type NOT NULL,
    value NUMERIC(19, 4) NOT NULL,
    fee NUMERIC(19, 4),
    currency VARCHAR(3) NOT NULL,
    currency_rate NUMERIC(19, 8),
    from_account_id UUID REFERENCES accounts(id) ON DELETE RESTRICT,
    to_account_id UUID REFERENCES accounts(id) ON DELETE RESTRICT,
    -- Deleting a category keeps its transactions
    from_category_id UUID REFERENCES transaction_categories(id) ON DELETE SET NULL,
    to_category_id UUID REFERENCES transaction_categories(id) ON DELETE SET NULL,
    from_account_updated_balance NUMERIC(19, 4),
    to_account_updated_balance NUMERIC(19, 4),
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_fee CHECK (fee IS NULL OR fee >= 0),
    CONSTRAINT chk_transactions_rate CHECK (currency_rate IS NULL OR currency_rate > 0),
    CONSTRAINT chk_transactions_one_source CHECK (from_account_id IS NULL OR from_category_id IS NULL),
    CONSTRAINT chk_transactions_one_target CHECK (to_account_id IS NULL OR to_category_id IS NULL)
);

CREATE INDEX idx_transactions_from_account ON transactions(from_account_id, created_at DESC)
    WHERE from_account_id IS NOT NULL;
CREATE INDEX idx_transactions_to_account ON transactions(to_account_id, created_at DESC)
    WHERE to_account_id IS NOT NULL;
CREATE INDEX idx_transactions_from_category ON transactions(from_category_id, created_at DESC)
    WHERE from_category_id IS NOT NULL;
CREATE INDEX idx_transactions_to_category ON transactions(to_category_id, created_at DESC)
    WHERE to_category_id IS NOT NULL;
CREATE INDEX idx_transactions_user ON transactions(user_id, created_at DESC);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS transaction_categories CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP TYPE IF EXISTS entity_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS category_type;
DROP TYPE IF EXISTS account_type;
";
