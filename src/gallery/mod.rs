//! Photo Gallery
//!
//! Upload and removal workflow behind each car's photo lists (external and
//! interior). A gallery is an ordered list of public URLs; this module
//! validates incoming files, stores accepted ones in the object store and
//! returns the new list. It never touches the record store: the car form
//! persists the list on save.

mod upload;

pub use upload::{
    GalleryError, IncomingPhoto, PhotoGallery, PhotoLimits, RejectReason, RejectedPhoto,
    UploadOutcome,
};
