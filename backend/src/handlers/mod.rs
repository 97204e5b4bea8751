//! HTTP handlers for the Entrepot Maritime platform

mod client;
mod commande;
mod dashboard;
mod emplacement;
mod livraison;
mod mouvement;
mod produit;
mod stock;

pub use client::*;
pub use commande::*;
pub use dashboard::*;
pub use emplacement::*;
pub use livraison::*;
pub use mouvement::*;
pub use produit::*;
pub use stock::*;
