//! Branch, blade type and user directories
//!
//! Each directory is a held [`Directory<T>`] collection plus the mutations in
//! [`DirectoryEditor`]. Mutations return the stored entity; callers fold it
//! into their collection with [`Directory::merge`] instead of refetching.
//!
//! Every mutation requires an administrator session.

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::auth::{check_new_password, normalize_email, AuthError, IdentityProvider};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::session::Session;
use crate::core::store::{DocumentStore, StoreError};
use crate::core::validation::{optional, required, selected, ValidationError};
use crate::entities::{Blade, BladeType, Branch, Role, User};

#[derive(Debug, Error, Diagnostic)]
pub enum DirectoryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Auth(#[from] AuthError),

    #[error("{id} not found in {collection}")]
    #[diagnostic(code(sawtrack::directory::not_found))]
    NotFound {
        collection: &'static str,
        id: EntityId,
    },

    #[error("branch {0} does not exist")]
    #[diagnostic(code(sawtrack::directory::unknown_branch))]
    UnknownBranch(EntityId),

    #[error("{0} is the last active administrator")]
    #[diagnostic(
        code(sawtrack::directory::last_administrator),
        help("Promote another user before demoting or deactivating this one")
    )]
    LastAdministrator(String),

    #[error("Operation failed, please try again")]
    #[diagnostic(code(sawtrack::directory::collaborator))]
    Collaborator { cause: StoreError },
}

fn collaborator(cause: StoreError) -> DirectoryError {
    error!(error = %cause, "document store call failed");
    DirectoryError::Collaborator { cause }
}

/// Records whose editable fields come from a form
pub trait EditableEntity: Entity {
    type Form;

    /// Overwrite the editable fields from a form
    fn apply(&mut self, form: &Self::Form, now: DateTime<Utc>) -> Result<(), ValidationError>;
}

/// Records that can be created directly from a form
pub trait CreatableEntity: EditableEntity {
    fn from_form(id: EntityId, form: &Self::Form, now: DateTime<Utc>) -> Result<Self, ValidationError>;
}

/// Records that may be deleted
pub trait Deletable: Entity {}

impl Deletable for Branch {}

// =========================================================================
// Forms
// =========================================================================

#[derive(Debug, Clone, Default)]
pub struct BranchForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub manager: Option<String>,
}

impl From<&Branch> for BranchForm {
    fn from(b: &Branch) -> Self {
        Self {
            name: b.name.clone(),
            address: b.address.clone(),
            phone: b.phone.clone(),
            manager: b.manager.clone(),
        }
    }
}

impl EditableEntity for Branch {
    type Form = BranchForm;

    fn apply(&mut self, form: &BranchForm, _now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.name = required("name", &form.name)?;
        self.address = required("address", &form.address)?;
        self.phone = required("phone", &form.phone)?;
        self.manager = optional(form.manager.as_deref());
        Ok(())
    }
}

impl CreatableEntity for Branch {
    fn from_form(id: EntityId, form: &BranchForm, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut branch = Branch {
            id,
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            manager: None,
            created: now,
        };
        branch.apply(form, now)?;
        Ok(branch)
    }
}

#[derive(Debug, Clone)]
pub struct BladeTypeForm {
    pub code: String,
    pub name: String,
    pub active: bool,
    pub description: Option<String>,
}

impl Default for BladeTypeForm {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            active: true,
            description: None,
        }
    }
}

impl From<&BladeType> for BladeTypeForm {
    fn from(t: &BladeType) -> Self {
        Self {
            code: t.code.clone(),
            name: t.name.clone(),
            active: t.active,
            description: t.description.clone(),
        }
    }
}

impl EditableEntity for BladeType {
    type Form = BladeTypeForm;

    fn apply(&mut self, form: &BladeTypeForm, _now: DateTime<Utc>) -> Result<(), ValidationError> {
        self.code = required("code", &form.code)?;
        self.name = required("name", &form.name)?;
        self.active = form.active;
        self.description = optional(form.description.as_deref());
        Ok(())
    }
}

impl CreatableEntity for BladeType {
    fn from_form(id: EntityId, form: &BladeTypeForm, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let mut blade_type = BladeType {
            id,
            code: String::new(),
            name: String::new(),
            active: true,
            description: None,
            created: now,
        };
        blade_type.apply(form, now)?;
        Ok(blade_type)
    }
}

/// User profile fields; the password is handled separately
#[derive(Debug, Clone)]
pub struct UserForm {
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub branch: Option<EntityId>,
    pub active: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            name: String::new(),
            role: None,
            branch: None,
            active: true,
        }
    }
}

impl From<&User> for UserForm {
    fn from(u: &User) -> Self {
        Self {
            email: u.email.clone(),
            name: u.name.clone(),
            role: Some(u.role),
            branch: Some(u.branch),
            active: u.active,
        }
    }
}

impl UserForm {
    fn validate(&self) -> Result<(String, String, Role, EntityId), ValidationError> {
        let email = normalize_email(&required("email", &self.email)?);
        if !email.contains('@') {
            return Err(ValidationError::Invalid {
                field: "email",
                message: format!("'{}' is not an email address", email),
            });
        }
        let name = required("name", &self.name)?;
        let role = selected("role", self.role)?;
        let branch = selected("branch", self.branch)?;
        Ok((email, name, role, branch))
    }
}

/// Overwrite a profile's editable fields; the email stays fixed
fn apply_user_form(user: &mut User, form: &UserForm, now: DateTime<Utc>) -> Result<(), ValidationError> {
    let (email, name, role, branch) = form.validate()?;
    if email != user.email {
        return Err(ValidationError::Invalid {
            field: "email",
            message: "the sign-in email cannot be changed".to_string(),
        });
    }
    user.name = name;
    user.role = role;
    user.branch = branch;
    user.active = form.active;
    user.updated_at = Some(now);
    Ok(())
}

// =========================================================================
// Held collections
// =========================================================================

/// A directory listing held by the caller
#[derive(Debug, Clone)]
pub struct Directory<T> {
    items: Vec<T>,
}

impl<T> Default for Directory<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Directory<T> {
    /// Fetch the whole collection, in store order
    pub fn load<S: DocumentStore>(store: &S) -> Result<Self, DirectoryError> {
        let items = store.fetch_all::<T>().map_err(collaborator)?;
        Ok(Self { items })
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Fold a stored entity in: replace the entry with the same id or append
    pub fn merge(&mut self, entity: T) {
        match self.items.iter().position(|item| item.id() == entity.id()) {
            Some(pos) => self.items[pos] = entity,
            None => self.items.push(entity),
        }
    }
}

// =========================================================================
// Mutations
// =========================================================================

/// Directory mutations on behalf of a signed-in administrator
pub struct DirectoryEditor<'a, S: DocumentStore> {
    store: &'a mut S,
    session: &'a Session,
}

impl<'a, S: DocumentStore> DirectoryEditor<'a, S> {
    pub fn new(store: &'a mut S, session: &'a Session) -> Self {
        Self { store, session }
    }

    fn fetch_existing<T: Entity>(&self, id: &EntityId) -> Result<T, DirectoryError> {
        self.store
            .fetch::<T>(id)
            .map_err(collaborator)?
            .ok_or(DirectoryError::NotFound {
                collection: T::collection(),
                id: *id,
            })
    }

    fn ensure_branch(&self, id: EntityId) -> Result<(), DirectoryError> {
        match self.store.fetch::<Branch>(&id).map_err(collaborator)? {
            Some(_) => Ok(()),
            None => Err(DirectoryError::UnknownBranch(id)),
        }
    }

    /// Create a record, stamping its creation time
    pub fn create<T: CreatableEntity>(&mut self, form: &T::Form) -> Result<T, DirectoryError> {
        self.session.require_admin("create records")?;
        let entity = T::from_form(EntityId::new(T::PREFIX), form, Utc::now())?;
        self.store.create(&entity).map_err(collaborator)?;
        info!(id = %entity.id(), title = entity.title(), "created record");
        Ok(entity)
    }

    /// Overwrite the editable fields of an existing record
    pub fn edit<T: EditableEntity>(&mut self, id: &EntityId, form: &T::Form) -> Result<T, DirectoryError> {
        self.session.require_admin("edit records")?;
        let mut entity: T = self.fetch_existing(id)?;
        entity.apply(form, Utc::now())?;
        self.store.update(&entity).map_err(collaborator)?;
        info!(id = %entity.id(), "updated record");
        Ok(entity)
    }

    /// Delete a record; the caller is responsible for confirmation
    pub fn delete<T: Deletable>(&mut self, id: &EntityId) -> Result<T, DirectoryError> {
        self.session.require_admin("delete records")?;
        let entity: T = self.fetch_existing(id)?;
        if T::PREFIX == EntityPrefix::Brn {
            let blades: Vec<Blade> = self
                .store
                .fetch_where("branch", &serde_json::Value::String(id.to_string()))
                .map_err(collaborator)?;
            if !blades.is_empty() {
                warn!(branch = %id, blades = blades.len(), "deleting a branch that still owns blades");
            }
        }
        self.store.delete::<T>(id).map_err(collaborator)?;
        info!(id = %id, "deleted record");
        Ok(entity)
    }

    /// Create a sign-in account and the matching user profile
    pub fn provision_user<I: IdentityProvider>(
        &mut self,
        identity: &mut I,
        form: &UserForm,
        password: &str,
        confirmation: Option<&str>,
    ) -> Result<User, DirectoryError> {
        self.session.require_admin("create users")?;
        let (email, name, role, branch) = form.validate()?;
        check_new_password(password, confirmation)?;
        self.ensure_branch(branch)?;

        let uid = identity.create_account(&email, password)?;
        let user = User {
            id: uid,
            email,
            name,
            role,
            branch,
            active: form.active,
            created_at: Utc::now(),
            updated_at: None,
        };
        if let Err(cause) = self.store.create(&user) {
            error!(error = %cause, uid = %uid, "account created but profile write failed");
            return Err(DirectoryError::Collaborator { cause });
        }
        info!(id = %user.id, role = %user.role, "provisioned user");
        Ok(user)
    }

    /// Edit a user profile, keeping at least one active administrator
    pub fn edit_user(&mut self, id: &EntityId, form: &UserForm) -> Result<User, DirectoryError> {
        self.session.require_admin("edit users")?;
        let before: User = self.fetch_existing(id)?;
        let mut after = before.clone();
        apply_user_form(&mut after, form, Utc::now())?;
        self.ensure_branch(after.branch)?;
        self.guard_last_admin(&before, &after)?;
        self.store.update(&after).map_err(collaborator)?;
        info!(id = %after.id, "updated user");
        Ok(after)
    }

    /// Flip a user between operator and administrator
    pub fn toggle_role(&mut self, id: &EntityId) -> Result<User, DirectoryError> {
        self.session.require_admin("change roles")?;
        let before: User = self.fetch_existing(id)?;
        let mut after = before.clone();
        after.role = before.role.toggled();
        after.updated_at = Some(Utc::now());
        self.guard_last_admin(&before, &after)?;
        self.store.update(&after).map_err(collaborator)?;
        info!(id = %after.id, role = %after.role, "changed role");
        Ok(after)
    }

    /// Flip a user's active flag
    pub fn toggle_active(&mut self, id: &EntityId) -> Result<User, DirectoryError> {
        self.session.require_admin("activate or deactivate users")?;
        let before: User = self.fetch_existing(id)?;
        let mut after = before.clone();
        after.active = !before.active;
        after.updated_at = Some(Utc::now());
        self.guard_last_admin(&before, &after)?;
        self.store.update(&after).map_err(collaborator)?;
        info!(id = %after.id, active = after.active, "changed active flag");
        Ok(after)
    }

    fn guard_last_admin(&self, before: &User, after: &User) -> Result<(), DirectoryError> {
        let was_admin = before.is_admin() && before.active;
        let still_admin = after.is_admin() && after.active;
        if !was_admin || still_admin {
            return Ok(());
        }
        let others = self
            .store
            .fetch_all::<User>()
            .map_err(collaborator)?
            .into_iter()
            .filter(|u| u.id != before.id && u.is_admin() && u.active)
            .count();
        if others == 0 {
            return Err(DirectoryError::LastAdministrator(before.email.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::LocalIdentity;
    use crate::core::store::{MemoryStore, WriteOp};

    fn branch_form(name: &str) -> BranchForm {
        BranchForm {
            name: name.to_string(),
            address: "Av. Central 10".to_string(),
            phone: "555-0100".to_string(),
            manager: None,
        }
    }

    fn user(role: Role, branch: EntityId) -> User {
        User {
            id: EntityId::new(EntityPrefix::Usr),
            email: format!("{}@example.com", role),
            name: role.to_string(),
            role,
            branch,
            active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Store with one branch and one admin; returns the admin session
    fn seeded() -> (MemoryStore, Session, Branch) {
        let mut store = MemoryStore::new();
        let branch = Branch::from_form(
            EntityId::new(EntityPrefix::Brn),
            &branch_form("Main"),
            Utc::now(),
        )
        .unwrap();
        store.create(&branch).unwrap();
        let admin = user(Role::Administrator, branch.id);
        store.create(&admin).unwrap();
        (store, Session::new(admin, Utc::now()), branch)
    }

    #[test]
    fn test_branch_create_edit_delete() {
        let (mut store, session, _) = seeded();
        let mut listing: Directory<Branch> = Directory::load(&store).unwrap();
        assert_eq!(listing.len(), 1);

        let mut editor = DirectoryEditor::new(&mut store, &session);
        let norte: Branch = editor.create(&branch_form("Norte")).unwrap();
        listing.merge(norte.clone());
        assert_eq!(listing.len(), 2);

        let mut form = BranchForm::from(&norte);
        form.phone = "555-0199".to_string();
        form.manager = Some("Luisa".to_string());
        let edited: Branch = editor.edit(&norte.id, &form).unwrap();
        listing.merge(edited);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.get(&norte.id).unwrap().phone, "555-0199");
        assert_eq!(listing.get(&norte.id).unwrap().created, norte.created);

        let deleted: Branch = editor.delete(&norte.id).unwrap();
        assert_eq!(deleted.id, norte.id);
        assert_eq!(store.len(EntityPrefix::Brn), 1);
        let listing: Directory<Branch> = Directory::load(&store).unwrap();
        assert!(listing.get(&norte.id).is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let (mut store, session, _) = seeded();
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let mut form = branch_form("Norte");
        form.phone = " ".to_string();
        assert!(matches!(
            editor.create::<Branch>(&form),
            Err(DirectoryError::Validation(ValidationError::Required("phone")))
        ));

        let form = BladeTypeForm {
            code: "T1".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            editor.create::<BladeType>(&form),
            Err(DirectoryError::Validation(ValidationError::Required("name")))
        ));
    }

    #[test]
    fn test_operator_cannot_mutate() {
        let (mut store, _, branch) = seeded();
        let operator = user(Role::Operator, branch.id);
        store.create(&operator).unwrap();
        let session = Session::new(operator, Utc::now());

        let mut editor = DirectoryEditor::new(&mut store, &session);
        assert!(matches!(
            editor.create::<Branch>(&branch_form("Norte")),
            Err(DirectoryError::Auth(AuthError::Forbidden(_)))
        ));
        assert!(matches!(
            editor.delete::<Branch>(&branch.id),
            Err(DirectoryError::Auth(AuthError::Forbidden(_)))
        ));
    }

    #[test]
    fn test_blade_type_deactivation() {
        let (mut store, session, _) = seeded();
        let mut editor = DirectoryEditor::new(&mut store, &session);
        let form = BladeTypeForm {
            code: "T1".to_string(),
            name: "Circular 300mm".to_string(),
            ..Default::default()
        };
        let created: BladeType = editor.create(&form).unwrap();
        assert!(created.active);

        let mut form = BladeTypeForm::from(&created);
        form.active = false;
        let edited: BladeType = editor.edit(&created.id, &form).unwrap();
        assert!(!edited.active);
    }

    #[test]
    fn test_provision_user() {
        let (mut store, session, branch) = seeded();
        let mut identity = LocalIdentity::in_memory();
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let form = UserForm {
            email: "Luis@Example.com".to_string(),
            name: "Luis".to_string(),
            role: Some(Role::Operator),
            branch: Some(branch.id),
            active: true,
        };
        assert!(matches!(
            editor.provision_user(&mut identity, &form, "secret1", Some("secret2")),
            Err(DirectoryError::Auth(AuthError::PasswordMismatch))
        ));
        assert!(matches!(
            editor.provision_user(&mut identity, &form, "abc", None),
            Err(DirectoryError::Auth(AuthError::WeakPassword))
        ));

        let created = editor
            .provision_user(&mut identity, &form, "secret1", Some("secret1"))
            .unwrap();
        assert_eq!(created.email, "luis@example.com");
        assert_eq!(identity.verify("luis@example.com", "secret1").unwrap(), created.id);
        assert!(store.fetch::<User>(&created.id).unwrap().is_some());
    }

    #[test]
    fn test_provision_user_unknown_branch() {
        let (mut store, session, _) = seeded();
        let mut identity = LocalIdentity::in_memory();
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let form = UserForm {
            email: "luis@example.com".to_string(),
            name: "Luis".to_string(),
            role: Some(Role::Operator),
            branch: Some(EntityId::new(EntityPrefix::Brn)),
            active: true,
        };
        assert!(matches!(
            editor.provision_user(&mut identity, &form, "secret1", None),
            Err(DirectoryError::UnknownBranch(_))
        ));
        assert!(!identity.has_account("luis@example.com"));
    }

    #[test]
    fn test_last_admin_cannot_be_demoted() {
        let (mut store, session, branch) = seeded();
        let admin_id = session.user_id();
        let operator = user(Role::Operator, branch.id);
        store.create(&operator).unwrap();

        let mut editor = DirectoryEditor::new(&mut store, &session);
        assert!(matches!(
            editor.toggle_role(&admin_id),
            Err(DirectoryError::LastAdministrator(_))
        ));
        assert!(matches!(
            editor.toggle_active(&admin_id),
            Err(DirectoryError::LastAdministrator(_))
        ));

        let promoted = editor.toggle_role(&operator.id).unwrap();
        assert_eq!(promoted.role, Role::Administrator);
        let demoted = editor.toggle_role(&admin_id).unwrap();
        assert_eq!(demoted.role, Role::Operator);
    }

    #[test]
    fn test_toggle_active() {
        let (mut store, session, branch) = seeded();
        let operator = user(Role::Operator, branch.id);
        store.create(&operator).unwrap();

        let mut editor = DirectoryEditor::new(&mut store, &session);
        let toggled = editor.toggle_active(&operator.id).unwrap();
        assert!(!toggled.active);
        assert!(toggled.updated_at.is_some());
        assert!(editor.toggle_active(&operator.id).unwrap().active);
    }

    #[test]
    fn test_user_email_is_fixed() {
        let (mut store, session, branch) = seeded();
        let operator = user(Role::Operator, branch.id);
        store.create(&operator).unwrap();

        let mut editor = DirectoryEditor::new(&mut store, &session);
        let mut form = UserForm::from(&operator);
        form.email = "other@example.com".to_string();
        assert!(matches!(
            editor.edit_user(&operator.id, &form),
            Err(DirectoryError::Validation(ValidationError::Invalid { field: "email", .. }))
        ));

        let mut form = UserForm::from(&operator);
        form.name = "Renamed".to_string();
        assert_eq!(editor.edit_user(&operator.id, &form).unwrap().name, "Renamed");
    }

    #[test]
    fn test_store_failure_is_generic() {
        let (mut store, session, _) = seeded();
        store.inject_failure(WriteOp::Create, EntityPrefix::Brn);
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let err = editor.create::<Branch>(&branch_form("Norte")).unwrap_err();
        assert_eq!(err.to_string(), "Operation failed, please try again");
    }

    #[test]
    fn test_edit_user_keeps_an_administrator() {
        let (mut store, session, branch) = seeded();
        let admin_id = session.user_id();
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let mut form = UserForm::from(session.user());
        form.role = Some(Role::Operator);
        assert!(matches!(
            editor.edit_user(&admin_id, &form),
            Err(DirectoryError::LastAdministrator(_))
        ));

        let mut form = UserForm::from(session.user());
        form.active = false;
        assert!(matches!(
            editor.edit_user(&admin_id, &form),
            Err(DirectoryError::LastAdministrator(_))
        ));

        let stored: User = store.fetch(&admin_id).unwrap().unwrap();
        assert_eq!(stored.role, Role::Administrator);
        assert!(stored.active);
        assert_eq!(stored.branch, branch.id);
    }

    #[test]
    fn test_edit_user_rejects_unknown_branch() {
        let (mut store, session, _) = seeded();
        let admin_id = session.user_id();
        let mut editor = DirectoryEditor::new(&mut store, &session);

        let mut form = UserForm::from(session.user());
        form.branch = Some(EntityId::new(EntityPrefix::Brn));
        assert!(matches!(
            editor.edit_user(&admin_id, &form),
            Err(DirectoryError::UnknownBranch(_))
        ));
    }
}
