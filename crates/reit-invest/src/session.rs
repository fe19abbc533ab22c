//! Who is acting. Resolved once per request from the ledger user row and
//! dispatched on at the top; leaves never re-check roles.

use crate::errors::LedgerError;
use crate::ledger::{InvestmentFilter, Ledger, Role, UserRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Session {
    Unauthenticated,
    Admin(UserRecord),
    Investor(UserRecord),
}

impl Session {
    /// Unknown or absent users are unauthenticated
    pub async fn resolve<L: Ledger>(ledger: &L, user_id: Option<&str>) -> Result<Self, LedgerError> {
        let Some(user_id) = user_id else {
            return Ok(Session::Unauthenticated);
        };
        Ok(match ledger.get_user(user_id).await? {
            None => Session::Unauthenticated,
            Some(user) => Self::from_user(user),
        })
    }

    pub fn from_user(user: UserRecord) -> Self {
        match user.role {
            Role::Admin => Session::Admin(user),
            Role::Investor => Session::Investor(user),
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Session::Unauthenticated => None,
            Session::Admin(user) | Session::Investor(user) => Some(user),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Session::Admin(_))
    }

    /// Investment listing scope: admins see everything, investors their own,
    /// anonymous visitors nothing
    pub fn investment_scope(&self) -> Option<InvestmentFilter> {
        match self {
            Session::Unauthenticated => None,
            Session::Admin(_) => Some(InvestmentFilter::all()),
            Session::Investor(user) => Some(InvestmentFilter::for_investor(user.user_id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    fn user(id: &str, role: Role) -> UserRecord {
        UserRecord {
            user_id: id.to_string(),
            role,
            investor_pda: None,
            email: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_roles() {
        let ledger = InMemoryLedger::new();
        ledger.insert_user(user("admin", Role::Admin)).await;
        ledger.insert_user(user("inv", Role::Investor)).await;

        assert!(Session::resolve(&ledger, Some("admin")).await.unwrap().is_admin());
        assert_eq!(
            Session::resolve(&ledger, Some("inv")).await.unwrap().investment_scope(),
            Some(InvestmentFilter::for_investor("inv"))
        );
        assert_eq!(
            Session::resolve(&ledger, Some("nobody")).await.unwrap(),
            Session::Unauthenticated
        );
        assert_eq!(Session::resolve(&ledger, None).await.unwrap().investment_scope(), None);
    }
}
