//! Composing and publishing a new listing
//!
//! A [`SubmissionFlow`] owns the form values and the draft list of uploaded
//! photos. Photos are uploaded one at a time as they are attached; the listing
//! itself is written by a single `create` call on submit.

mod form;
mod state;

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::auth::{SessionProvider, SessionUser};
use crate::error::{Error, Result};
use crate::listings::{ImageRef, Listing, ListingRepository, NewListing};
use crate::notify::{Notice, Notifier};
use crate::storage::{ImageBlob, ImageStore, UploadedImage};

pub use form::*;
pub use state::*;

pub const UNSUPPORTED_IMAGE_MESSAGE: &str = "Send a JPEG or PNG image";
pub const IMAGE_UPLOADED_MESSAGE: &str = "Image uploaded successfully!";
pub const MISSING_IMAGES_MESSAGE: &str = "Send at least 1 image!";
pub const LISTING_CREATED_MESSAGE: &str = "Listing created successfully!";

/// What a submit attempt led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Listing),

    /// Nothing was written because no photo is attached
    MissingImages,
}

/// The new-listing page: form, draft photos and the submission state
pub struct SubmissionFlow {
    session: Arc<dyn SessionProvider>,
    listings: Arc<dyn ListingRepository>,
    images: Arc<dyn ImageStore>,
    notifier: Arc<dyn Notifier>,
    cleanup_orphaned_images: bool,
    form: ListingForm,
    draft: Vec<UploadedImage>,
    state: SubmissionState,
}

impl SubmissionFlow {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        listings: Arc<dyn ListingRepository>,
        images: Arc<dyn ImageStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            listings,
            images,
            notifier,
            cleanup_orphaned_images: false,
            form: ListingForm::new(),
            draft: Vec::new(),
            state: SubmissionState::Idle,
        }
    }

    /// Delete uploaded photos again when writing the listing fails
    pub fn with_cleanup_orphaned_images(mut self, value: bool) -> Self {
        self.cleanup_orphaned_images = value;
        self
    }

    pub fn form(&self) -> &ListingForm {
        &self.form
    }

    pub fn draft(&self) -> &[UploadedImage] {
        &self.draft
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn field_errors(&self) -> &FieldErrors {
        self.form.errors()
    }

    /// Change one form value; the field is validated immediately
    pub fn set_field(&mut self, field: Field, value: &str) -> Option<FieldError> {
        self.form.set_field(field, value)
    }

    fn apply(&mut self, event: SubmissionEvent) -> Result<()> {
        self.state = transition(&self.state, event)?;
        Ok(())
    }

    fn current_user(&self) -> Result<SessionUser> {
        self.session.user().ok_or(Error::NotSignedIn)
    }

    /// Validate and upload one photo, appending it to the draft on success.
    ///
    /// Anything but JPEG or PNG raises a blocking alert and is never uploaded.
    /// A failed upload leaves the draft as it was and raises no notice.
    pub async fn attach_image(&mut self, blob: ImageBlob) -> Result<UploadedImage> {
        if let Err(e) = blob.kind() {
            self.notifier
                .notify(Notice::Alert(UNSUPPORTED_IMAGE_MESSAGE.to_string()));
            return Err(e);
        }

        let user = self.current_user()?;
        let pending = InFlight::begin(&mut self.state, SubmissionEvent::UploadStarted)?;
        let result = self.images.upload(&user.id, &blob).await;
        pending.finish();

        let uploaded = match result {
            Ok(uploaded) => uploaded,
            Err(e) => {
                warn!("upload of {} failed: {}", blob.file_name, e);
                self.apply(SubmissionEvent::UploadFinished {
                    images: self.draft.len(),
                })?;
                return Err(e);
            }
        };

        debug!("attached {} as {}", blob.file_name, uploaded.image.name);
        self.draft.push(uploaded.clone());
        self.apply(SubmissionEvent::UploadFinished {
            images: self.draft.len(),
        })?;
        self.notifier
            .notify(Notice::Success(IMAGE_UPLOADED_MESSAGE.to_string()));

        Ok(uploaded)
    }

    /// Delete an attached photo from storage, then drop it from the draft.
    ///
    /// Returns `false` when nothing was removed; storage failures are logged
    /// and leave the draft untouched.
    pub async fn remove_image(&mut self, url: &str) -> Result<bool> {
        let image = match self.draft.iter().find(|item| item.image.url == url) {
            Some(item) => item.image.clone(),
            None => return Ok(false),
        };

        if let Err(e) = self.images.delete(&image.owner_id, &image.name).await {
            warn!("could not delete image {}: {}", image.name, e);
            return Ok(false);
        }

        self.draft.retain(|item| item.image.url != url);
        self.apply(SubmissionEvent::ImagesChanged {
            images: self.draft.len(),
        })?;
        Ok(true)
    }

    /// Validate the form and write the listing.
    ///
    /// Field errors come back as `Error::Validation` and an empty draft as
    /// [`SubmitOutcome::MissingImages`]; neither writes anything. When the
    /// write fails the form and draft are kept so the user can try again.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        self.form.validate().map_err(Error::Validation)?;

        if self.draft.is_empty() {
            self.notifier
                .notify(Notice::Error(MISSING_IMAGES_MESSAGE.to_string()));
            return Ok(SubmitOutcome::MissingImages);
        }

        let user = self.current_user()?;
        let listing = self.new_listing(&user);

        let pending = InFlight::begin(&mut self.state, SubmissionEvent::SubmitStarted)?;
        let result = self.listings.create(listing).await;
        pending.finish();

        match result {
            Ok(created) => {
                info!("published listing {} for {}", created.id, user.id);
                self.form.reset();
                self.draft.clear();
                self.apply(SubmissionEvent::SubmitSucceeded)?;
                self.notifier
                    .notify(Notice::Success(LISTING_CREATED_MESSAGE.to_string()));
                Ok(SubmitOutcome::Created(created))
            }
            Err(e) => {
                error!("creating listing failed: {}", e);
                if self.cleanup_orphaned_images {
                    self.discard_uploaded_images().await;
                }
                self.apply(SubmissionEvent::SubmitFailed {
                    reason: e.to_string(),
                })?;
                Err(e)
            }
        }
    }

    fn new_listing(&self, user: &SessionUser) -> NewListing {
        NewListing {
            name: self.form.name.to_uppercase(),
            model: self.form.model.clone(),
            year: self.form.year.clone(),
            odometer: self.form.km.clone(),
            price: self.form.price.clone(),
            city: self.form.city.clone(),
            contact: self.form.whatsapp.clone(),
            description: self.form.description.clone(),
            created_at: Utc::now(),
            owner_name: user.name.clone(),
            owner_id: user.id.clone(),
            images: self
                .draft
                .iter()
                .map(|item| ImageRef {
                    owner_id: item.image.owner_id.clone(),
                    name: item.image.name.clone(),
                    url: item.image.url.clone(),
                })
                .collect(),
        }
    }

    async fn discard_uploaded_images(&mut self) {
        let mut kept = Vec::new();
        for item in std::mem::take(&mut self.draft) {
            match self
                .images
                .delete(&item.image.owner_id, &item.image.name)
                .await
            {
                Ok(()) => debug!("deleted orphaned image {}", item.image.name),
                Err(e) => {
                    warn!("orphaned image {} left in storage: {}", item.image.name, e);
                    kept.push(item);
                }
            }
        }
        self.draft = kept;
    }
}
