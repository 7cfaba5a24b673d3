use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::staff_role::StaffRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub display_name: String,
    /// Tenant scoping key; every query is restricted to matching rows.
    pub organization: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_change_request::Entity")]
    RoleChangeRequests,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::role_change_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleChangeRequests.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parse the stored role string; accounts are only ever written with
    /// valid roles, so a parse failure indicates manual tampering.
    pub fn staff_role(&self) -> Option<StaffRole> {
        StaffRole::parse(&self.role)
    }
}
