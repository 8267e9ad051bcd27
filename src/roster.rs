//! The editable list of signers a document is sent to.
//!
//! All mutations replace entries in place and finish by re-deriving `order`,
//! so the roster is always either fully numbered (sequential) or not at all.

use crate::error::{Error, Result};
use crate::profile::UserProfile;
use crate::signer::{Deputy, DeputyForm, Signer, SignerForm};
use rand::Rng;

const LOCAL_ID_LEN: usize = 9;
const LOCAL_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short random base36 identifier, unique enough within one roster.
pub(crate) fn generate_local_id() -> String {
    let mut rng = rand::thread_rng();
    (0..LOCAL_ID_LEN)
        .map(|_| LOCAL_ID_ALPHABET[rng.gen_range(0..LOCAL_ID_ALPHABET.len())] as char)
        .collect()
}

/// Move one element of `list` from `from` to `to`, shifting the others.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Result<Vec<T>> {
    let len = list.len();
    for index in [from, to] {
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
    }
    let mut result = list.to_vec();
    let moved = result.remove(from);
    result.insert(to, moved);
    Ok(result)
}

#[derive(Debug, Clone, Default)]
pub struct SignerRoster {
    signers: Vec<Signer>,
    sequential: bool,
    /// The authenticated user, used for the "I will sign" entry.
    owner: Option<UserProfile>,
}

impl SignerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signers(&self) -> &[Signer] {
        &self.signers
    }

    pub fn is_sequential(&self) -> bool {
        self.sequential
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Signer> {
        self.signers.iter().find(|signer| signer.id == id)
    }

    /// The "I will sign" flag. Derived from the entries so it can never drift.
    pub fn self_signing(&self) -> bool {
        self.self_index().is_some()
    }

    fn self_index(&self) -> Option<usize> {
        let owner = self.owner.as_ref()?;
        self.signers
            .iter()
            .position(|signer| signer.user_id.as_deref() == Some(owner.id.as_str()))
    }

    fn self_entry(owner: &UserProfile) -> Signer {
        Signer::for_user(generate_local_id(), owner)
    }

    /// Remember the authenticated user and seed an empty roster with them.
    pub fn initialize_self(&mut self, user: &UserProfile) {
        self.owner = Some(user.clone());
        if self.signers.is_empty() {
            self.signers.push(Self::self_entry(user));
            self.renumber();
        }
    }

    /// Add the user if they are not signing, remove them if they are.
    pub fn toggle_self_participation(&mut self) -> Result<bool> {
        let owner = self.owner.clone().ok_or(Error::NotAuthenticated)?;
        match self.self_index() {
            Some(index) => {
                self.signers.remove(index);
            }
            None => self.signers.push(Self::self_entry(&owner)),
        }
        self.renumber();
        Ok(self.self_signing())
    }

    /// Append a signer, returning the new local id.
    pub fn add_signer(&mut self, form: SignerForm) -> Result<String> {
        if form.full_name.trim().is_empty() && form.email.trim().is_empty() {
            return Err(Error::Validation(
                "A signer needs at least a name or an email".to_owned(),
            ));
        }
        if let (Some(owner), Some(user_id)) = (&self.owner, &form.user_id) {
            if owner.id == *user_id && self.self_signing() {
                return Err(Error::Validation(
                    "You are already in the signer list".to_owned(),
                ));
            }
        }
        let id = generate_local_id();
        self.signers.push(Signer::from_form(id.clone(), form));
        self.renumber();
        Ok(id)
    }

    /// Overwrite the editable fields. `id` and `user_id` are kept.
    pub fn edit_signer(&mut self, id: &str, form: SignerForm) -> Result<()> {
        let signer = self.find_mut(id)?;
        signer.full_name = form.full_name;
        signer.email = form.email;
        signer.position = form.position;
        signer.iin = form.iin;
        Ok(())
    }

    /// Remove a signer. An emptied roster is reseeded with the user.
    pub fn delete_signer(&mut self, id: &str) -> Result<Signer> {
        let index = self
            .signers
            .iter()
            .position(|signer| signer.id == id)
            .ok_or_else(|| Error::SignerNotFound(id.to_owned()))?;
        let removed = self.signers.remove(index);
        if self.signers.is_empty() {
            if let Some(owner) = &self.owner {
                log::debug!("Roster emptied, reseeding with the current user.");
                self.signers.push(Self::self_entry(owner));
            }
        }
        self.renumber();
        Ok(removed)
    }

    pub fn reorder_signer(&mut self, from: usize, to: usize) -> Result<()> {
        if !self.sequential {
            return Err(Error::SequentialDisabled);
        }
        self.signers = reorder(&self.signers, from, to)?;
        self.renumber();
        Ok(())
    }

    pub fn set_sequential_mode(&mut self, enabled: bool) {
        self.sequential = enabled;
        self.renumber();
    }

    /// Attach a deputy, replacing any previous one.
    pub fn set_deputy(&mut self, signer_id: &str, form: DeputyForm) -> Result<()> {
        if form.name.trim().is_empty() && form.email.trim().is_empty() {
            return Err(Error::Validation(
                "A deputy needs at least a name or an email".to_owned(),
            ));
        }
        let signer = self.find_mut(signer_id)?;
        signer.deputy = Some(Deputy {
            id: generate_local_id(),
            name: form.name,
            email: form.email,
        });
        Ok(())
    }

    pub fn clear_deputy(&mut self, signer_id: &str) -> Result<Option<Deputy>> {
        Ok(self.find_mut(signer_id)?.deputy.take())
    }

    /// The signer list as sent when the approval starts.
    pub fn to_payload(&self) -> Vec<Signer> {
        self.signers.clone()
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Signer> {
        self.signers
            .iter_mut()
            .find(|signer| signer.id == id)
            .ok_or_else(|| Error::SignerNotFound(id.to_owned()))
    }

    fn renumber(&mut self) {
        let sequential = self.sequential;
        for (index, signer) in self.signers.iter_mut().enumerate() {
            signer.order = if sequential { Some(index as u32) } else { None };
        }
    }
}
