//! Business logic services for the Entrepot Maritime platform

pub mod client;
pub mod commande;
pub mod emplacement;
pub mod livraison;
pub mod mouvement;
pub mod produit;
pub mod sequence;
pub mod stock;

pub use client::ClientService;
pub use commande::CommandeService;
pub use emplacement::EmplacementService;
pub use livraison::LivraisonService;
pub use mouvement::MouvementService;
pub use produit::ProduitService;
pub use sequence::SequenceService;
pub use stock::StockService;
