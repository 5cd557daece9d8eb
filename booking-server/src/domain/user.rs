use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    Electrician,
    Carpentry,
    CarWasher,
    Plumbing,
    ApplianceRepair,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::Electrician,
        ServiceType::Carpentry,
        ServiceType::CarWasher,
        ServiceType::Plumbing,
        ServiceType::ApplianceRepair,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Electrician => "Electrician",
            ServiceType::Carpentry => "Carpentry",
            ServiceType::CarWasher => "CarWasher",
            ServiceType::Plumbing => "Plumbing",
            ServiceType::ApplianceRepair => "ApplianceRepair",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::invalid_format(format!("unknown service type: {s}")))
    }
}

/// Coarse role used for authorization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "provider" => Ok(Role::Provider),
            other => Err(DomainError::invalid_format(format!(
                "role must be either customer or provider, got {other}"
            ))),
        }
    }
}

/// What kind of account a user holds. A provider always carries the service
/// it offers; a customer never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Account {
    Customer,
    Provider { service_type: ServiceType },
}

impl Account {
    pub fn from_parts(role: Role, service_type: Option<ServiceType>) -> Result<Self, DomainError> {
        match (role, service_type) {
            (Role::Customer, None) => Ok(Account::Customer),
            (Role::Customer, Some(_)) => Err(DomainError::validation(
                "service type can only be set for providers",
            )),
            (Role::Provider, Some(service_type)) => Ok(Account::Provider { service_type }),
            (Role::Provider, None) => Err(DomainError::validation(
                "service type is required for providers",
            )),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Customer => Role::Customer,
            Account::Provider { .. } => Role::Provider,
        }
    }

    pub fn service_type(&self) -> Option<ServiceType> {
        match self {
            Account::Customer => None,
            Account::Provider { service_type } => Some(*service_type),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub account: Account,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, account: Account) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            account,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.account.role()
    }

    #[cfg(test)]
    pub fn provider_profile(&self) -> Option<ProviderProfile> {
        match self.account {
            Account::Provider { service_type } => Some(ProviderProfile {
                id: self.id,
                name: self.name.clone(),
                service_type,
            }),
            Account::Customer => None,
        }
    }

    #[cfg(test)]
    pub fn customer_profile(&self) -> CustomerProfile {
        CustomerProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public face of a provider, embedded in slot and reservation responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub name: String,
    pub service_type: ServiceType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_requires_service_type() {
        let err = Account::from_parts(Role::Provider, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let account = Account::from_parts(Role::Provider, Some(ServiceType::Plumbing)).unwrap();
        assert_eq!(account.role(), Role::Provider);
        assert_eq!(account.service_type(), Some(ServiceType::Plumbing));
    }

    #[test]
    fn customer_rejects_service_type() {
        assert!(Account::from_parts(Role::Customer, Some(ServiceType::Carpentry)).is_err());
        assert_eq!(
            Account::from_parts(Role::Customer, None).unwrap(),
            Account::Customer
        );
    }

    #[test]
    fn service_type_parses_wire_names() {
        assert_eq!(
            "CarWasher".parse::<ServiceType>().unwrap(),
            ServiceType::CarWasher
        );
        assert!(matches!(
            "carwasher".parse::<ServiceType>(),
            Err(DomainError::InvalidFormat(_))
        ));
    }

    #[test]
    fn only_providers_have_a_provider_profile() {
        let customer = User::new(
            "Asha".into(),
            "asha@example.com".into(),
            "hash".into(),
            Account::Customer,
        );
        assert!(customer.provider_profile().is_none());
        assert_eq!(customer.customer_profile().email, "asha@example.com");
    }
}
