pub mod reference;
pub mod ticket;

pub use reference::{Agent, Magasin, NewAgent, TaxonomyEntry, TaxonomyLevel, TaxonomyPath};
pub use ticket::{
    Statut, StoreLink, TaxonomyLevels, Ticket, TicketFields, TicketForm, TicketSummary,
    TRAITEMENT_EXCEPTIONNEL, TRAITEMENT_NORMAL,
};
