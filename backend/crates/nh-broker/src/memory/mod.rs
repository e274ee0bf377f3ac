pub mod in_memory_broker_link;
