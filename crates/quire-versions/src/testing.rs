//! Fixtures shared by the unit tests.

use quire_storage::{
    Associations, DisplayMetadata, DocumentationId, EntityRef, MockStorage, NewDocumentation,
    NewPage, NewPageGroup, PageGroupId, PageId, Storage, Transaction, UserId,
};

pub(crate) struct Fixture {
    pub storage: MockStorage,
    pub alice: UserId,
    pub bob: UserId,
}

impl Fixture {
    pub fn new() -> Self {
        let storage = MockStorage::new().with_user("alice").with_user("bob");
        let alice = storage.user_id("alice").unwrap();
        let bob = storage.user_id("bob").unwrap();
        Self {
            storage,
            alice,
            bob,
        }
    }

    fn documentation(&self, name: &str, cloned_from: Option<DocumentationId>) -> NewDocumentation {
        NewDocumentation {
            name: name.to_owned(),
            description: format!("{name} description"),
            version: "1.0".to_owned(),
            cloned_from,
            author_id: self.alice,
            last_editor_id: Some(self.bob),
            display: DisplayMetadata {
                favicon: "favicon.png".to_owned(),
                copyright_text: "(c) Quire".to_owned(),
                ..DisplayMetadata::default()
            },
        }
    }

    /// Create a root documentation edited by alice.
    pub async fn root(&self, name: &str) -> DocumentationId {
        let mut tx = self.storage.begin().await.unwrap();
        let id = tx
            .create_documentation(&self.documentation(name, None))
            .await
            .unwrap();
        tx.append_editor(EntityRef::Documentation(id), self.alice)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    }

    /// Create a bare documentation row whose source is `source`.
    pub async fn fork_row(&self, source: DocumentationId) -> DocumentationId {
        let mut tx = self.storage.begin().await.unwrap();
        let id = tx
            .create_documentation(&self.documentation("Handbook", Some(source)))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    }

    pub async fn group(
        &self,
        documentation: DocumentationId,
        parent: Option<PageGroupId>,
        name: &str,
    ) -> PageGroupId {
        let mut tx = self.storage.begin().await.unwrap();
        let id = tx
            .create_page_group(&NewPageGroup {
                documentation_id: documentation,
                parent_id: parent,
                name: name.to_owned(),
                order: Some(1),
                author_id: self.bob,
            })
            .await
            .unwrap();
        tx.append_editor(EntityRef::PageGroup(id), self.bob)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    }

    pub async fn page(
        &self,
        documentation: DocumentationId,
        group: Option<PageGroupId>,
        title: &str,
    ) -> PageId {
        let mut tx = self.storage.begin().await.unwrap();
        let id = tx
            .create_page(&NewPage {
                documentation_id: documentation,
                page_group_id: group,
                title: title.to_owned(),
                slug: format!("/{}", title.to_lowercase()),
                content: format!("[\"{title} body\"]"),
                order: Some(2),
                author_id: self.alice,
                last_editor_id: Some(self.alice),
            })
            .await
            .unwrap();
        tx.append_editor(EntityRef::Page(id), self.alice)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        id
    }

    /// Rewrite the `cloned_from` link of a stored documentation.
    pub async fn set_cloned_from(&self, id: DocumentationId, source: Option<DocumentationId>) {
        let mut tx = self.storage.begin().await.unwrap();
        let mut documentation = tx
            .load_documentation(id, Associations::NONE)
            .await
            .unwrap();
        documentation.cloned_from = source;
        tx.update_documentation(&documentation).await.unwrap();
        tx.commit().await.unwrap();
    }
}
