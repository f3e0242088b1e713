//! SeaORM entity models
//!
//! Database entities for IdeaHub

mod idea;
mod user;

pub use idea::{
    Entity as IdeaEntity,
    Model as Idea,
    ActiveModel as IdeaActiveModel,
    Column as IdeaColumn,
    IdeaStatus,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    UserRole,
};
