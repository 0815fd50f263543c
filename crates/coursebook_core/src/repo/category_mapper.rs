//! Mapper for course categories.

use super::gateway::{checked_row, text, TableGateway, TableSpec};
use super::{Filter, MappedEntity, Mapper, RepoResult};
use crate::model::category::Category;
use crate::model::{Entity, EntityId, EntityKind};
use rusqlite::{Connection, Row};

const CATEGORIES: TableSpec = TableSpec {
    name: "categories",
    columns: &["title", "short_title", "description"],
};

pub struct CategoryMapper<'conn> {
    gateway: TableGateway<'conn>,
}

impl<'conn> CategoryMapper<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            gateway: TableGateway::new(conn, EntityKind::Category, CATEGORIES),
        }
    }
}

impl Mapper for CategoryMapper<'_> {
    type Entity = Category;

    fn kind(&self) -> EntityKind {
        EntityKind::Category
    }

    fn create(&self, category: &Category) -> RepoResult<EntityId> {
        category.validate()?;
        self.gateway.insert(category_values(category))
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<Category> {
        self.gateway.select_one(id, parse_category_row)
    }

    fn get_by_filter(&self, filter: &Filter) -> RepoResult<Vec<Category>> {
        self.gateway.select(filter, parse_category_row)
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;
        self.gateway.update(category.id, category_values(category))
    }

    fn delete(&self, category: &Category) -> RepoResult<()> {
        self.gateway.delete(category.id)
    }

    fn commit(&self) -> RepoResult<()> {
        self.gateway.commit()
    }

    fn rollback(&self) -> RepoResult<()> {
        self.gateway.rollback()
    }
}

impl MappedEntity for Category {
    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Category(category) => Some(category),
            _ => None,
        }
    }
}

fn category_values(category: &Category) -> Vec<rusqlite::types::Value> {
    vec![
        text(&category.title),
        text(&category.short_title),
        text(&category.description),
    ]
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let category = Category {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        short_title: row.get("short_title")?,
        description: row.get("description")?,
    };
    checked_row(CATEGORIES.name, category, Category::validate)
}
