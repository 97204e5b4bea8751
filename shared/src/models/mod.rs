//! Domain models for the Entrepot Maritime platform

mod client;
mod commande;
mod emplacement;
mod livraison;
mod mouvement;
mod produit;
mod stock;

pub use client::*;
pub use commande::*;
pub use emplacement::*;
pub use livraison::*;
pub use mouvement::*;
pub use produit::*;
pub use stock::*;
