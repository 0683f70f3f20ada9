mod mem_quad_store;
