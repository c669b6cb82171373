//! Account record and its authentication state machine

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::auth;
use crate::clock::Clock;
use crate::error::AuthError;
use crate::policy::PolicyStore;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One registered principal.
///
/// Every state transition reads the live `PolicyStore`, never a cached copy,
/// so a policy change is visible to all accounts on their next call. The
/// mutable fields are only reachable through `&mut self`, which makes
/// increment-then-check in `login` atomic for a single account; share an
/// account across threads behind a `Mutex` if you need concurrent callers.
pub struct Account {
    id: u32,
    display_name: String,
    email: String,
    credential_digest: String,
    registered_at: DateTime<Utc>,
    last_access_at: DateTime<Utc>,
    failed_attempts: u32,
    locked: bool,
    policy: PolicyStore,
    clock: Arc<dyn Clock>,
}

/// Read-only projection of an account for display rows.
#[derive(Serialize, Clone, Debug)]
pub struct AccountInfo {
    pub id: u32,
    pub display_name: String,
    pub email: String,
    pub registered_at: String,
    pub last_access_at: String,
    pub failed_attempts: u32,
    pub locked: bool,
    pub session_expired: bool,
}

impl Account {
    /// Register a new account. The secret is validated against the live
    /// `min_password_length` policy and stored only as a digest.
    pub fn create(
        policy: &PolicyStore,
        clock: Arc<dyn Clock>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        secret: &str,
    ) -> Result<Self, AuthError> {
        let minimum = policy.min_password_length();
        if secret.chars().count() < minimum {
            return Err(AuthError::PolicyViolation { minimum });
        }

        let credential_digest = auth::digest_secret(secret)?;
        let now = clock.now();

        Ok(Self {
            id: rand::thread_rng().gen_range(10000..=99999),
            display_name: display_name.into(),
            email: email.into(),
            credential_digest,
            registered_at: now,
            last_access_at: now,
            failed_attempts: 0,
            locked: false,
            policy: policy.clone(),
            clock,
        })
    }

    /// Attempt a login.
    ///
    /// - `Ok(true)`: correct secret; counter reset, last access bumped.
    /// - `Ok(false)`: wrong secret but the account is still usable.
    /// - `Err(AccountLocked)`: already locked, or this very call recorded the
    ///   failure that crossed `max_login_attempts`.
    /// - `Err(MaintenanceActive)`: maintenance flag is set; counters untouched.
    pub fn login(&mut self, attempted_secret: &str) -> Result<bool, AuthError> {
        if self.locked {
            return Err(AuthError::AccountLocked);
        }

        if self.policy.is_under_maintenance() {
            return Err(AuthError::MaintenanceActive);
        }

        if auth::verify_secret(attempted_secret, &self.credential_digest) {
            self.failed_attempts = 0;
            self.last_access_at = self.clock.now();
            return Ok(true);
        }

        self.failed_attempts += 1;
        if self.failed_attempts >= self.policy.max_login_attempts() {
            self.locked = true;
            return Err(AuthError::AccountLocked);
        }

        Ok(false)
    }

    /// Whether more than `session_timeout_minutes` have passed since the last
    /// successful access or renewal. Pure read, mutates nothing.
    ///
    /// Compared at second granularity: 30m59s on a 30-minute timeout is
    /// expired, exactly 30m00s is not.
    pub fn session_expired(&self) -> bool {
        let timeout = self.policy.session_timeout_minutes();
        let elapsed = self.clock.now() - self.last_access_at;
        elapsed.num_seconds() > timeout * 60
    }

    /// Mark session activity now.
    pub fn renew_session(&mut self) {
        self.last_access_at = self.clock.now();
    }

    /// Clear the lock and the failure counter. Safe on an unlocked account.
    pub fn unlock(&mut self) {
        self.locked = false;
        self.failed_attempts = 0;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    pub fn last_access_at(&self) -> DateTime<Utc> {
        self.last_access_at
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Display projection. Formatting happens here so callers get plain
    /// strings; the underlying timestamps stay `DateTime<Utc>` on the account.
    pub fn export_info(&self) -> AccountInfo {
        AccountInfo {
            id: self.id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            registered_at: self.registered_at.format(TIMESTAMP_FORMAT).to_string(),
            last_access_at: self.last_access_at.format(TIMESTAMP_FORMAT).to_string(),
            failed_attempts: self.failed_attempts,
            locked: self.locked,
            session_expired: self.session_expired(),
        }
    }
}

// The credential digest stays out of debug output.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("registered_at", &self.registered_at)
            .field("last_access_at", &self.last_access_at)
            .field("failed_attempts", &self.failed_attempts)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (PolicyStore, Arc<ManualClock>) {
        (PolicyStore::new(), Arc::new(ManualClock::from_system()))
    }

    fn make_account(policy: &PolicyStore, clock: Arc<ManualClock>) -> Account {
        Account::create(policy, clock, "Ana García", "ana@example.com", "Password123").unwrap()
    }

    #[test]
    fn test_create_enforces_min_password_length() {
        let (policy, clock) = setup();

        let err = Account::create(&policy, clock.clone(), "Pedro López", "pedro@example.com", "123")
            .unwrap_err();
        assert_eq!(err, AuthError::PolicyViolation { minimum: 8 });

        let account =
            Account::create(&policy, clock, "Carlos Ruiz", "carlos@example.com", "Segura456")
                .unwrap();
        assert_eq!(account.failed_attempts(), 0);
        assert!(!account.is_locked());
    }

    #[test]
    fn test_create_min_length_boundary() {
        let (policy, clock) = setup();
        policy.set(crate::policy::MIN_PASSWORD_LENGTH, 8i64);

        // 8 characters: allowed
        Account::create(&policy, clock.clone(), "A", "a@example.com", "12345678").unwrap();
        // 7 characters: rejected
        let err = Account::create(&policy, clock, "B", "b@example.com", "1234567").unwrap_err();
        assert_eq!(err, AuthError::PolicyViolation { minimum: 8 });
    }

    #[test]
    fn test_create_initial_state() {
        let (policy, clock) = setup();
        let account = make_account(&policy, clock.clone());

        assert!((10000..=99999).contains(&account.id()));
        assert_eq!(account.display_name(), "Ana García");
        assert_eq!(account.email(), "ana@example.com");
        assert_eq!(account.registered_at(), account.last_access_at());
        assert_eq!(account.registered_at(), clock.now());
    }

    #[test]
    fn test_successful_login() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock.clone());

        clock.advance_minutes(5);
        assert_eq!(account.login("Password123"), Ok(true));
        assert_eq!(account.failed_attempts(), 0);
        assert_eq!(account.last_access_at(), clock.now());
    }

    #[test]
    fn test_lockout_threshold() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        // max_login_attempts defaults to 3: two soft failures, then the lock
        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.failed_attempts(), 1);
        assert!(!account.is_locked());

        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.failed_attempts(), 2);
        assert!(!account.is_locked());

        // The third failure both records the attempt and reports the lock
        assert_eq!(account.login("wrong"), Err(AuthError::AccountLocked));
        assert_eq!(account.failed_attempts(), 3);
        assert!(account.is_locked());
    }

    #[test]
    fn test_locked_account_rejects_correct_secret() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        for _ in 0..2 {
            assert_eq!(account.login("wrong"), Ok(false));
        }
        assert_eq!(account.login("wrong"), Err(AuthError::AccountLocked));

        // Correct credentials no longer matter, and the counter stays put
        assert_eq!(account.login("Password123"), Err(AuthError::AccountLocked));
        assert_eq!(account.failed_attempts(), 3);
    }

    #[test]
    fn test_failed_attempts_reset_on_success() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("Password123"), Ok(true));
        assert_eq!(account.failed_attempts(), 0);

        // A fresh run of failures is needed to lock
        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("wrong"), Err(AuthError::AccountLocked));
    }

    #[test]
    fn test_failed_login_does_not_touch_last_access() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock.clone());
        let registered = account.last_access_at();

        clock.advance_minutes(10);
        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.last_access_at(), registered);
    }

    #[test]
    fn test_maintenance_blocks_all_logins() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        policy.enter_maintenance();
        assert_eq!(
            account.login("Password123"),
            Err(AuthError::MaintenanceActive)
        );
        assert_eq!(account.login("wrong"), Err(AuthError::MaintenanceActive));
        assert_eq!(account.failed_attempts(), 0);
        assert!(!account.is_locked());

        policy.exit_maintenance();
        assert_eq!(account.login("Password123"), Ok(true));
    }

    #[test]
    fn test_policy_change_is_visible_immediately() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("wrong"), Ok(false));

        // Raising the threshold through another handle rescues the account
        let admin_handle = policy.clone();
        admin_handle.set(crate::policy::MAX_LOGIN_ATTEMPTS, 5i64);

        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("wrong"), Ok(false));
        assert_eq!(account.login("wrong"), Err(AuthError::AccountLocked));
        assert_eq!(account.failed_attempts(), 5);
    }

    #[test]
    fn test_session_expiry_is_strict_and_pure() {
        let (policy, clock) = setup();
        let account = make_account(&policy, clock.clone());

        // Timeout is 30 minutes; exactly 30 is not expired (strictly greater)
        clock.advance_minutes(30);
        assert!(!account.session_expired());

        clock.advance_minutes(1);
        assert!(account.session_expired());

        // Repeated reads mutate nothing
        let before = account.last_access_at();
        for _ in 0..5 {
            account.session_expired();
        }
        assert_eq!(account.last_access_at(), before);
        assert_eq!(account.failed_attempts(), 0);
    }

    #[test]
    fn test_session_expiry_counts_seconds() {
        let (policy, clock) = setup();
        let account = make_account(&policy, clock.clone());

        // 30m59s on a 30-minute timeout is past the threshold even though
        // the elapsed whole-minute count is still 30
        clock.advance_minutes(30);
        clock.advance_seconds(59);
        assert!(account.session_expired());
    }

    #[test]
    fn test_debug_output_omits_credential_digest() {
        let (policy, clock) = setup();
        let account = make_account(&policy, clock);

        let rendered = format!("{:?}", account);
        assert!(rendered.contains("Ana García"));
        assert!(rendered.contains("failed_attempts"));
        assert!(!rendered.contains("$argon2"));
    }

    #[test]
    fn test_renew_session_resets_expiry() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock.clone());

        clock.advance_minutes(45);
        assert!(account.session_expired());

        account.renew_session();
        assert!(!account.session_expired());
        assert_eq!(account.last_access_at(), clock.now());
    }

    #[test]
    fn test_expired_session_does_not_lock_account() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock.clone());

        clock.advance_minutes(120);
        assert!(account.session_expired());
        assert!(!account.is_locked());
        assert_eq!(account.login("Password123"), Ok(true));
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock);

        // Unlocking an active account is a no-op
        account.unlock();
        assert!(!account.is_locked());
        assert_eq!(account.failed_attempts(), 0);

        for _ in 0..2 {
            assert_eq!(account.login("wrong"), Ok(false));
        }
        assert_eq!(account.login("wrong"), Err(AuthError::AccountLocked));

        account.unlock();
        assert!(!account.is_locked());
        assert_eq!(account.failed_attempts(), 0);
        assert_eq!(account.login("Password123"), Ok(true));
    }

    #[test]
    fn test_export_info() {
        let (policy, clock) = setup();
        let mut account = make_account(&policy, clock.clone());
        assert_eq!(account.login("wrong"), Ok(false));

        clock.advance_minutes(31);
        let info = account.export_info();

        assert_eq!(info.id, account.id());
        assert_eq!(info.display_name, "Ana García");
        assert_eq!(info.email, "ana@example.com");
        assert_eq!(info.failed_attempts, 1);
        assert!(!info.locked);
        assert!(info.session_expired);
        // dd/mm/yyyy hh:mm:ss
        assert_eq!(info.registered_at.len(), 19);
    }

    #[test]
    fn test_full_lockout_scenario() {
        // Policy 8/3/30, 11-character secret
        let (policy, clock) = setup();
        policy.set(crate::policy::MIN_PASSWORD_LENGTH, 8i64);
        policy.set(crate::policy::MAX_LOGIN_ATTEMPTS, 3i64);
        policy.set(crate::policy::SESSION_TIMEOUT_MINUTES, 30i64);

        let mut account =
            Account::create(&policy, clock, "Laura Pérez", "laura@example.com", "MiClave789!")
                .unwrap();

        assert_eq!(account.login("nope"), Ok(false));
        assert_eq!(account.login("nope"), Ok(false));
        assert_eq!(account.login("nope"), Err(AuthError::AccountLocked));
        assert_eq!(account.login("MiClave789!"), Err(AuthError::AccountLocked));

        account.unlock();
        assert_eq!(account.login("MiClave789!"), Ok(true));
        assert_eq!(account.failed_attempts(), 0);
    }
}
