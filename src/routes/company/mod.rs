mod handler;

pub use handler::{
    create_company, delete_company, list_companies, paginated_companies, search_companies,
    update_company,
};
